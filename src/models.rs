use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub user_name: String,
    pub course_code: String,
    pub course_title: Option<String>,
    pub program: String,
    pub department: String,
    pub visit_date: NaiveDate,
    pub visits_on_that_day: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseVisits {
    pub course_code: String,
    pub course_title: Option<String>,
    pub total_visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCourseVisits {
    pub program: String,
    pub course_code: String,
    pub total_visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramVisits {
    pub program: String,
    pub total_visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramUsers {
    pub program: String,
    pub unique_users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentUsers {
    pub department: String,
    pub unique_users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentProgramUsers {
    pub department: String,
    pub program: String,
    pub unique_users: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyVisits {
    pub visit_date: NaiveDate,
    pub total_visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastVisit {
    pub user_name: String,
    pub course_code: String,
    pub last_visit: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCourseVisits {
    pub user_name: String,
    pub course_code: String,
    pub visit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopVisitor {
    pub course_code: String,
    pub user_name: String,
    pub visit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeakDay {
    pub course_code: String,
    pub user_name: String,
    pub visit_date: NaiveDate,
    pub visits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitStreak {
    pub user_name: String,
    pub course_code: String,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitGap {
    pub user_name: String,
    pub course_code: String,
    pub longest_gap_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowParticipation {
    pub user_name: String,
    pub unique_courses: usize,
    pub span_days: i64,
}

/// Every derived table produced for one pass over the visit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSet {
    pub total_visits_per_course: Vec<CourseVisits>,
    pub visits_per_course_by_program: Vec<ProgramCourseVisits>,
    pub visits_per_program: Vec<ProgramVisits>,
    pub distinct_users_per_program: Vec<ProgramUsers>,
    pub unique_visitors_per_department: Vec<DepartmentUsers>,
    pub distinct_users_per_department_program: Vec<DepartmentProgramUsers>,
    pub visits_trend: Vec<DailyVisits>,
    pub most_recent_visits: Vec<LastVisit>,
    pub visit_counts: Vec<UserCourseVisits>,
    pub top_visitor_per_course: Vec<TopVisitor>,
    pub peak_single_day_per_course: Vec<PeakDay>,
    pub longest_streaks: Vec<VisitStreak>,
    pub longest_gaps: Vec<VisitGap>,
    pub multi_course_window: Vec<WindowParticipation>,
}
