use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tokio::task::JoinHandle;

use crate::models::{
    CourseVisits, DailyVisits, DepartmentProgramUsers, DepartmentUsers, LastVisit, PeakDay,
    ProgramCourseVisits, ProgramUsers, ProgramVisits, ReportSet, TopVisitor, UserCourseVisits,
    VisitGap, VisitRecord, VisitStreak, WindowParticipation,
};

pub const DEFAULT_WINDOW_DAYS: i64 = 3;

/// Visits grouped once by (user, course), then by date.
///
/// Duplicate rows for the same date are summed into a single entry, so the
/// inner map doubles as the sorted list of distinct visit dates.
#[derive(Debug, Default)]
pub struct UserCourseHistory {
    groups: BTreeMap<(String, String), BTreeMap<NaiveDate, u64>>,
}

impl UserCourseHistory {
    pub fn build(records: &[VisitRecord]) -> Self {
        let mut groups: BTreeMap<(String, String), BTreeMap<NaiveDate, u64>> = BTreeMap::new();

        for record in records {
            let daily = groups
                .entry((record.user_name.clone(), record.course_code.clone()))
                .or_default();
            *daily.entry(record.visit_date).or_insert(0) += record.visits_on_that_day;
        }

        Self { groups }
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &str, &BTreeMap<NaiveDate, u64>)> {
        self.groups
            .iter()
            .map(|((user, course), daily)| (user.as_str(), course.as_str(), daily))
    }
}

pub fn total_visits_per_course(records: &[VisitRecord]) -> Vec<CourseVisits> {
    let mut map: HashMap<&str, (Option<&str>, u64)> = HashMap::new();

    for record in records {
        let entry = map.entry(record.course_code.as_str()).or_insert((None, 0));
        if entry.0.is_none() {
            entry.0 = record.course_title.as_deref();
        }
        entry.1 += record.visits_on_that_day;
    }

    let mut totals: Vec<CourseVisits> = map
        .into_iter()
        .map(|(course_code, (title, total_visits))| CourseVisits {
            course_code: course_code.to_string(),
            course_title: title.map(str::to_string),
            total_visits,
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total_visits
            .cmp(&a.total_visits)
            .then_with(|| a.course_code.cmp(&b.course_code))
    });
    totals
}

pub fn visits_per_course_by_program(records: &[VisitRecord]) -> Vec<ProgramCourseVisits> {
    let mut map: BTreeMap<(&str, &str), u64> = BTreeMap::new();

    for record in records {
        *map.entry((record.program.as_str(), record.course_code.as_str()))
            .or_insert(0) += record.visits_on_that_day;
    }

    map.into_iter()
        .map(|((program, course_code), total_visits)| ProgramCourseVisits {
            program: program.to_string(),
            course_code: course_code.to_string(),
            total_visits,
        })
        .collect()
}

pub fn visits_per_program(records: &[VisitRecord]) -> Vec<ProgramVisits> {
    let mut map: BTreeMap<&str, u64> = BTreeMap::new();

    for record in records {
        *map.entry(record.program.as_str()).or_insert(0) += record.visits_on_that_day;
    }

    map.into_iter()
        .map(|(program, total_visits)| ProgramVisits {
            program: program.to_string(),
            total_visits,
        })
        .collect()
}

pub fn distinct_users_per_program(records: &[VisitRecord]) -> Vec<ProgramUsers> {
    count_distinct_users(records, |record| record.program.as_str())
        .into_iter()
        .map(|(program, unique_users)| ProgramUsers {
            program: program.to_string(),
            unique_users,
        })
        .collect()
}

pub fn unique_visitors_per_department(records: &[VisitRecord]) -> Vec<DepartmentUsers> {
    count_distinct_users(records, |record| record.department.as_str())
        .into_iter()
        .map(|(department, unique_users)| DepartmentUsers {
            department: department.to_string(),
            unique_users,
        })
        .collect()
}

pub fn distinct_users_per_department_program(
    records: &[VisitRecord],
) -> Vec<DepartmentProgramUsers> {
    count_distinct_users(records, |record| {
        (record.department.as_str(), record.program.as_str())
    })
    .into_iter()
    .map(|((department, program), unique_users)| DepartmentProgramUsers {
        department: department.to_string(),
        program: program.to_string(),
        unique_users,
    })
    .collect()
}

fn count_distinct_users<'a, K, F>(records: &'a [VisitRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&'a VisitRecord) -> K,
{
    let mut users: BTreeMap<K, HashSet<&'a str>> = BTreeMap::new();

    for record in records {
        users
            .entry(key(record))
            .or_default()
            .insert(record.user_name.as_str());
    }

    users
        .into_iter()
        .map(|(group, names)| (group, names.len()))
        .collect()
}

pub fn visits_trend(records: &[VisitRecord]) -> Vec<DailyVisits> {
    let mut map: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for record in records {
        *map.entry(record.visit_date).or_insert(0) += record.visits_on_that_day;
    }

    map.into_iter()
        .map(|(visit_date, total_visits)| DailyVisits {
            visit_date,
            total_visits,
        })
        .collect()
}

pub fn most_recent_visits(records: &[VisitRecord]) -> Vec<LastVisit> {
    most_recent_visits_from(&UserCourseHistory::build(records))
}

pub fn most_recent_visits_from(history: &UserCourseHistory) -> Vec<LastVisit> {
    let mut visits: Vec<LastVisit> = history
        .iter()
        .filter_map(|(user, course, daily)| {
            daily.keys().next_back().map(|last| LastVisit {
                user_name: user.to_string(),
                course_code: course.to_string(),
                last_visit: *last,
            })
        })
        .collect();

    // stable sort keeps (user, course) ascending among equal dates
    visits.sort_by(|a, b| b.last_visit.cmp(&a.last_visit));
    visits
}

pub fn visit_counts(records: &[VisitRecord]) -> Vec<UserCourseVisits> {
    visit_counts_from(&UserCourseHistory::build(records))
}

pub fn visit_counts_from(history: &UserCourseHistory) -> Vec<UserCourseVisits> {
    history
        .iter()
        .map(|(user, course, daily)| UserCourseVisits {
            user_name: user.to_string(),
            course_code: course.to_string(),
            visit_count: daily.values().sum(),
        })
        .collect()
}

pub fn top_visitor_per_course(records: &[VisitRecord]) -> Vec<TopVisitor> {
    top_visitor_per_course_from(&UserCourseHistory::build(records))
}

/// One row per course: the user with the highest visit count, ties going to
/// the alphabetically first user name.
pub fn top_visitor_per_course_from(history: &UserCourseHistory) -> Vec<TopVisitor> {
    let mut best: BTreeMap<&str, TopVisitor> = BTreeMap::new();

    for (user, course, daily) in history.iter() {
        let visit_count: u64 = daily.values().sum();
        let candidate = TopVisitor {
            course_code: course.to_string(),
            user_name: user.to_string(),
            visit_count,
        };

        let replace = match best.get(course) {
            None => true,
            Some(current) => {
                visit_count > current.visit_count
                    || (visit_count == current.visit_count
                        && candidate.user_name < current.user_name)
            }
        };

        if replace {
            best.insert(course, candidate);
        }
    }

    best.into_values().collect()
}

pub fn peak_single_day_per_course(records: &[VisitRecord]) -> Vec<PeakDay> {
    peak_single_day_per_course_from(&UserCourseHistory::build(records))
}

/// One row per course: the (user, date) with the most visits summed over
/// duplicate rows. Ties go to the first user name, then the earliest date.
pub fn peak_single_day_per_course_from(history: &UserCourseHistory) -> Vec<PeakDay> {
    let mut best: BTreeMap<&str, PeakDay> = BTreeMap::new();

    for (user, course, daily) in history.iter() {
        for (date, visits) in daily {
            let replace = match best.get(course) {
                None => true,
                Some(current) => {
                    *visits > current.visits
                        || (*visits == current.visits
                            && (user, *date) < (current.user_name.as_str(), current.visit_date))
                }
            };

            if replace {
                best.insert(
                    course,
                    PeakDay {
                        course_code: course.to_string(),
                        user_name: user.to_string(),
                        visit_date: *date,
                        visits: *visits,
                    },
                );
            }
        }
    }

    best.into_values().collect()
}

pub fn longest_streaks(records: &[VisitRecord]) -> Vec<VisitStreak> {
    longest_streaks_from(&UserCourseHistory::build(records))
}

pub fn longest_streaks_from(history: &UserCourseHistory) -> Vec<VisitStreak> {
    history
        .iter()
        .map(|(user, course, daily)| VisitStreak {
            user_name: user.to_string(),
            course_code: course.to_string(),
            longest_streak: longest_streak(daily.keys().copied()),
        })
        .collect()
}

pub fn longest_gaps(records: &[VisitRecord]) -> Vec<VisitGap> {
    longest_gaps_from(&UserCourseHistory::build(records))
}

pub fn longest_gaps_from(history: &UserCourseHistory) -> Vec<VisitGap> {
    history
        .iter()
        .map(|(user, course, daily)| VisitGap {
            user_name: user.to_string(),
            course_code: course.to_string(),
            longest_gap_days: longest_gap(daily.keys().copied()),
        })
        .collect()
}

/// Longest run of calendar-consecutive dates. Expects ascending, distinct
/// dates; a single date is a streak of 1 and no dates is 0.
pub fn longest_streak(dates: impl IntoIterator<Item = NaiveDate>) -> u32 {
    let mut dates = dates.into_iter();
    let Some(mut previous) = dates.next() else {
        return 0;
    };

    let mut current = 1;
    let mut best = 1;

    for date in dates {
        if (date - previous).num_days() == 1 {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
        previous = date;
    }

    best
}

/// Largest day difference between consecutive ascending, distinct dates;
/// 0 when there are fewer than two.
pub fn longest_gap(dates: impl IntoIterator<Item = NaiveDate>) -> i64 {
    let mut dates = dates.into_iter();
    let Some(mut previous) = dates.next() else {
        return 0;
    };

    let mut best = 0;
    for date in dates {
        best = best.max((date - previous).num_days());
        previous = date;
    }

    best
}

/// Users whose whole activity span (last visit minus first visit, in days)
/// fits inside `window_days`, with the number of distinct courses they
/// touched.
pub fn multi_course_window(records: &[VisitRecord], window_days: i64) -> Vec<WindowParticipation> {
    let mut users: BTreeMap<&str, (NaiveDate, NaiveDate, BTreeSet<&str>)> = BTreeMap::new();

    for record in records {
        let entry = users.entry(record.user_name.as_str()).or_insert((
            record.visit_date,
            record.visit_date,
            BTreeSet::new(),
        ));
        entry.0 = entry.0.min(record.visit_date);
        entry.1 = entry.1.max(record.visit_date);
        entry.2.insert(record.course_code.as_str());
    }

    let mut rows: Vec<WindowParticipation> = users
        .into_iter()
        .filter_map(|(user, (first, last, courses))| {
            let span_days = (last - first).num_days();
            (span_days <= window_days).then(|| WindowParticipation {
                user_name: user.to_string(),
                unique_courses: courses.len(),
                span_days,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.unique_courses.cmp(&a.unique_courses));
    rows
}

/// Runs every report as its own blocking task over the shared table and
/// collects the results.
pub async fn generate(records: Arc<[VisitRecord]>, window_days: i64) -> anyhow::Result<ReportSet> {
    let history = Arc::new(UserCourseHistory::build(&records));

    let total = spawn_report("total_visits_per_course", &records, total_visits_per_course);
    let by_program = spawn_report(
        "visits_per_course_by_program",
        &records,
        visits_per_course_by_program,
    );
    let per_program = spawn_report("visits_per_program", &records, visits_per_program);
    let program_users = spawn_report(
        "distinct_users_per_program",
        &records,
        distinct_users_per_program,
    );
    let department_users = spawn_report(
        "unique_visitors_per_department",
        &records,
        unique_visitors_per_department,
    );
    let department_program_users = spawn_report(
        "distinct_users_per_department_program",
        &records,
        distinct_users_per_department_program,
    );
    let trend = spawn_report("visits_trend", &records, visits_trend);
    let recent = spawn_report("most_recent_visits", &history, most_recent_visits_from);
    let counts = spawn_report("visit_counts", &history, visit_counts_from);
    let top = spawn_report(
        "top_visitor_per_course",
        &history,
        top_visitor_per_course_from,
    );
    let peak = spawn_report(
        "peak_single_day_per_course",
        &history,
        peak_single_day_per_course_from,
    );
    let streaks = spawn_report("longest_streaks", &history, longest_streaks_from);
    let gaps = spawn_report("longest_gaps", &history, longest_gaps_from);
    let window = spawn_report("multi_course_window", &records, move |records| {
        multi_course_window(records, window_days)
    });

    Ok(ReportSet {
        total_visits_per_course: join_report("total_visits_per_course", total).await?,
        visits_per_course_by_program: join_report("visits_per_course_by_program", by_program)
            .await?,
        visits_per_program: join_report("visits_per_program", per_program).await?,
        distinct_users_per_program: join_report("distinct_users_per_program", program_users)
            .await?,
        unique_visitors_per_department: join_report(
            "unique_visitors_per_department",
            department_users,
        )
        .await?,
        distinct_users_per_department_program: join_report(
            "distinct_users_per_department_program",
            department_program_users,
        )
        .await?,
        visits_trend: join_report("visits_trend", trend).await?,
        most_recent_visits: join_report("most_recent_visits", recent).await?,
        visit_counts: join_report("visit_counts", counts).await?,
        top_visitor_per_course: join_report("top_visitor_per_course", top).await?,
        peak_single_day_per_course: join_report("peak_single_day_per_course", peak).await?,
        longest_streaks: join_report("longest_streaks", streaks).await?,
        longest_gaps: join_report("longest_gaps", gaps).await?,
        multi_course_window: join_report("multi_course_window", window).await?,
    })
}

fn spawn_report<S, T, F>(name: &'static str, source: &Arc<S>, report: F) -> JoinHandle<Vec<T>>
where
    S: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> Vec<T> + Send + 'static,
{
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || {
        let rows = report(&*source);
        tracing::debug!(report = name, rows = rows.len(), "report computed");
        rows
    })
}

async fn join_report<T>(name: &'static str, handle: JoinHandle<Vec<T>>) -> anyhow::Result<Vec<T>> {
    handle
        .await
        .with_context(|| format!("{name} report task failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
    }

    fn visit(user: &str, course: &str, day: &str, visits: u64) -> VisitRecord {
        VisitRecord {
            user_name: user.to_string(),
            course_code: course.to_string(),
            course_title: Some(format!("{course} title")),
            program: "Computing".to_string(),
            department: "Engineering".to_string(),
            visit_date: date(day),
            visits_on_that_day: visits,
        }
    }

    fn with_program(mut record: VisitRecord, program: &str, department: &str) -> VisitRecord {
        record.program = program.to_string();
        record.department = department.to_string();
        record
    }

    fn alice_cs101() -> Vec<VisitRecord> {
        vec![
            visit("alice", "CS101", "2024-01-01", 2),
            visit("alice", "CS101", "2024-01-02", 3),
            visit("alice", "CS101", "2024-01-04", 1),
        ]
    }

    #[test]
    fn end_to_end_example_matches_hand_computation() {
        let records = alice_cs101();

        let totals = total_visits_per_course(&records);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].course_code, "CS101");
        assert_eq!(totals[0].total_visits, 6);

        let streaks = longest_streaks(&records);
        assert_eq!(streaks[0].longest_streak, 2);

        let gaps = longest_gaps(&records);
        assert_eq!(gaps[0].longest_gap_days, 2);
    }

    #[test]
    fn course_totals_sum_every_row_and_sort_descending() {
        let records = vec![
            visit("alice", "CS101", "2024-01-01", 2),
            visit("bob", "MA201", "2024-01-01", 7),
            visit("carol", "CS101", "2024-01-03", 4),
            visit("alice", "CS101", "2024-01-01", 1),
        ];

        let totals = total_visits_per_course(&records);
        assert_eq!(totals[0].course_code, "CS101");
        assert_eq!(totals[0].total_visits, 7);
        assert_eq!(totals[0].course_title.as_deref(), Some("CS101 title"));
        assert_eq!(totals[1].course_code, "MA201");
        assert_eq!(totals[1].total_visits, 7);
    }

    #[test]
    fn course_title_falls_back_to_first_present_value() {
        let mut untitled = visit("alice", "CS101", "2024-01-01", 1);
        untitled.course_title = None;
        let records = vec![untitled, visit("bob", "CS101", "2024-01-02", 1)];

        let totals = total_visits_per_course(&records);
        assert_eq!(totals[0].course_title.as_deref(), Some("CS101 title"));
    }

    #[test]
    fn program_course_visits_are_grouped_by_program_then_course() {
        let records = vec![
            with_program(visit("alice", "MA201", "2024-01-01", 1), "Maths", "Science"),
            with_program(visit("bob", "CS101", "2024-01-01", 2), "Computing", "Engineering"),
            with_program(visit("carol", "CS050", "2024-01-02", 3), "Computing", "Engineering"),
            with_program(visit("dan", "CS101", "2024-01-03", 4), "Computing", "Engineering"),
        ];

        let rows = visits_per_course_by_program(&records);
        let keys: Vec<(&str, &str, u64)> = rows
            .iter()
            .map(|row| (row.program.as_str(), row.course_code.as_str(), row.total_visits))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Computing", "CS050", 3),
                ("Computing", "CS101", 6),
                ("Maths", "MA201", 1),
            ]
        );

        let programs = visits_per_program(&records);
        assert_eq!(programs[0].program, "Computing");
        assert_eq!(programs[0].total_visits, 9);
        assert_eq!(programs[1].total_visits, 1);
    }

    #[test]
    fn distinct_users_ignore_repeat_rows() {
        let records = vec![
            with_program(visit("alice", "CS101", "2024-01-01", 1), "Computing", "Engineering"),
            with_program(visit("alice", "CS102", "2024-01-02", 1), "Computing", "Engineering"),
            with_program(visit("alice", "CS101", "2024-01-03", 1), "Computing", "Engineering"),
            with_program(visit("bob", "CS101", "2024-01-01", 1), "Computing", "Engineering"),
            with_program(visit("alice", "MA201", "2024-01-01", 1), "Maths", "Science"),
        ];

        let programs = distinct_users_per_program(&records);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].program, "Computing");
        assert_eq!(programs[0].unique_users, 2);
        assert_eq!(programs[1].unique_users, 1);

        for row in &programs {
            let program_rows = records.iter().filter(|r| r.program == row.program).count();
            assert!(row.unique_users <= program_rows);
        }

        let departments = unique_visitors_per_department(&records);
        assert_eq!(departments[0].department, "Engineering");
        assert_eq!(departments[0].unique_users, 2);

        let pairs = distinct_users_per_department_program(&records);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].department, "Engineering");
        assert_eq!(pairs[0].program, "Computing");
        assert_eq!(pairs[0].unique_users, 2);
        assert_eq!(pairs[1].department, "Science");
    }

    #[test]
    fn trend_is_ascending_by_date() {
        let records = vec![
            visit("alice", "CS101", "2024-01-03", 2),
            visit("bob", "CS101", "2024-01-01", 3),
            visit("carol", "MA201", "2024-01-03", 4),
        ];

        let trend = visits_trend(&records);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].visit_date, date("2024-01-01"));
        assert_eq!(trend[0].total_visits, 3);
        assert_eq!(trend[1].total_visits, 6);
    }

    #[test]
    fn most_recent_visits_sort_latest_first() {
        let records = vec![
            visit("alice", "CS101", "2024-01-01", 1),
            visit("alice", "CS101", "2024-01-05", 1),
            visit("bob", "CS101", "2024-01-03", 1),
            visit("bob", "MA201", "2024-01-05", 1),
        ];

        let recent = most_recent_visits(&records);
        let keys: Vec<(&str, &str, NaiveDate)> = recent
            .iter()
            .map(|row| (row.user_name.as_str(), row.course_code.as_str(), row.last_visit))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("alice", "CS101", date("2024-01-05")),
                ("bob", "MA201", date("2024-01-05")),
                ("bob", "CS101", date("2024-01-03")),
            ]
        );
    }

    #[test]
    fn visit_counts_sum_per_user_and_course() {
        let mut records = alice_cs101();
        records.push(visit("bob", "CS101", "2024-01-01", 4));

        let counts = visit_counts(&records);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].user_name, "alice");
        assert_eq!(counts[0].visit_count, 6);
        assert_eq!(counts[1].visit_count, 4);
    }

    #[test]
    fn top_visitor_picks_highest_count_per_course() {
        let records = vec![
            visit("alice", "CS101", "2024-01-01", 2),
            visit("bob", "CS101", "2024-01-01", 5),
            visit("alice", "CS101", "2024-01-02", 1),
            visit("carol", "MA201", "2024-01-01", 1),
        ];

        let top = top_visitor_per_course(&records);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].course_code, "CS101");
        assert_eq!(top[0].user_name, "bob");
        assert_eq!(top[0].visit_count, 5);
        assert_eq!(top[1].course_code, "MA201");
        assert_eq!(top[1].user_name, "carol");
    }

    #[test]
    fn top_visitor_ties_go_to_first_user_name_regardless_of_row_order() {
        let forward = vec![
            visit("zoe", "CS101", "2024-01-01", 3),
            visit("adam", "CS101", "2024-01-02", 3),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = top_visitor_per_course(&forward);
        for _ in 0..5 {
            assert_eq!(top_visitor_per_course(&forward), first);
        }
        assert_eq!(top_visitor_per_course(&reversed), first);
        assert_eq!(first[0].user_name, "adam");
    }

    #[test]
    fn peak_day_sums_duplicate_rows_and_breaks_ties_deterministically() {
        let records = vec![
            visit("bob", "CS101", "2024-01-02", 2),
            visit("bob", "CS101", "2024-01-02", 2),
            visit("alice", "CS101", "2024-01-03", 4),
            visit("alice", "CS101", "2024-01-01", 4),
            visit("carol", "CS101", "2024-01-01", 3),
        ];

        let peak = peak_single_day_per_course(&records);
        assert_eq!(peak.len(), 1);
        assert_eq!(peak[0].user_name, "alice");
        assert_eq!(peak[0].visit_date, date("2024-01-01"));
        assert_eq!(peak[0].visits, 4);
    }

    #[test]
    fn single_visit_groups_have_streak_one_and_gap_zero() {
        let records = vec![
            visit("alice", "CS101", "2024-01-01", 1),
            visit("bob", "MA201", "2024-03-09", 4),
        ];

        for streak in longest_streaks(&records) {
            assert_eq!(streak.longest_streak, 1);
        }
        for gap in longest_gaps(&records) {
            assert_eq!(gap.longest_gap_days, 0);
        }
    }

    #[test]
    fn duplicate_dates_collapse_for_streaks_and_gaps() {
        let records = vec![
            visit("alice", "CS101", "2024-01-01", 1),
            visit("alice", "CS101", "2024-01-01", 1),
            visit("alice", "CS101", "2024-01-02", 1),
        ];

        assert_eq!(longest_streaks(&records)[0].longest_streak, 2);
        assert_eq!(longest_gaps(&records)[0].longest_gap_days, 1);
    }

    #[test]
    fn streak_finds_best_run_not_last_run() {
        let dates = ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-07", "2024-01-08"]
            .into_iter()
            .map(date);
        assert_eq!(longest_streak(dates), 3);
        assert_eq!(longest_streak(std::iter::empty()), 0);
    }

    #[test]
    fn appending_next_day_never_shortens_streak() {
        let mut records = vec![
            visit("alice", "CS101", "2024-01-01", 1),
            visit("alice", "CS101", "2024-01-02", 1),
            visit("alice", "CS101", "2024-01-05", 1),
        ];
        let mut previous = longest_streaks(&records)[0].longest_streak;

        for day in ["2024-01-06", "2024-01-07", "2024-01-08"] {
            records.push(visit("alice", "CS101", day, 1));
            let streak = longest_streaks(&records)[0].longest_streak;
            assert!(streak >= previous);
            previous = streak;
        }
        assert_eq!(previous, 4);
    }

    #[test]
    fn gap_spans_month_boundaries() {
        let records = vec![
            visit("alice", "CS101", "2024-01-30", 1),
            visit("alice", "CS101", "2024-03-01", 1),
        ];
        assert_eq!(longest_gaps(&records)[0].longest_gap_days, 31);
    }

    #[test]
    fn window_excludes_users_with_long_spans() {
        let records = vec![
            visit("u", "CS101", "2024-01-01", 1),
            visit("u", "CS102", "2024-01-02", 1),
            visit("u", "CS103", "2024-01-10", 1),
        ];
        assert!(multi_course_window(&records, DEFAULT_WINDOW_DAYS).is_empty());
    }

    #[test]
    fn window_includes_users_within_span() {
        let records = vec![
            visit("u", "CS101", "2024-01-01", 1),
            visit("u", "CS102", "2024-01-03", 1),
            visit("v", "CS101", "2024-01-05", 1),
        ];

        let rows = multi_course_window(&records, DEFAULT_WINDOW_DAYS);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_name, "u");
        assert_eq!(rows[0].unique_courses, 2);
        assert_eq!(rows[0].span_days, 2);
        assert_eq!(rows[1].user_name, "v");
        assert_eq!(rows[1].unique_courses, 1);
    }

    #[test]
    fn window_includes_span_equal_to_window() {
        let records = vec![
            visit("u", "CS101", "2024-01-01", 1),
            visit("u", "CS102", "2024-01-04", 1),
            visit("v", "CS101", "2024-01-01", 1),
            visit("v", "CS102", "2024-01-05", 1),
        ];

        let rows = multi_course_window(&records, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_name, "u");
        assert_eq!(rows[0].unique_courses, 2);
        assert_eq!(rows[0].span_days, 3);
    }

    #[test]
    fn zero_window_keeps_same_day_users_only() {
        let records = vec![
            visit("u", "CS101", "2024-01-01", 1),
            visit("u", "CS102", "2024-01-01", 2),
            visit("v", "CS101", "2024-01-01", 1),
            visit("v", "CS102", "2024-01-02", 1),
        ];

        let rows = multi_course_window(&records, 0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_name, "u");
        assert_eq!(rows[0].unique_courses, 2);
        assert_eq!(rows[0].span_days, 0);
    }

    #[test]
    fn empty_input_yields_empty_reports() {
        let records: Vec<VisitRecord> = Vec::new();
        assert!(total_visits_per_course(&records).is_empty());
        assert!(visits_trend(&records).is_empty());
        assert!(longest_streaks(&records).is_empty());
        assert!(multi_course_window(&records, DEFAULT_WINDOW_DAYS).is_empty());
    }

    #[test]
    fn reports_leave_source_rows_untouched() {
        let records = alice_cs101();
        let snapshot = records.clone();

        let _ = longest_streaks(&records);
        let _ = longest_gaps(&records);
        let _ = top_visitor_per_course(&records);

        assert_eq!(records, snapshot);
    }

    #[tokio::test]
    async fn generate_matches_individual_reports() {
        let mut records = alice_cs101();
        records.push(visit("bob", "MA201", "2024-01-02", 5));
        let shared: Arc<[VisitRecord]> = records.clone().into();

        let set = generate(shared, DEFAULT_WINDOW_DAYS).await.unwrap();

        assert_eq!(set.total_visits_per_course, total_visits_per_course(&records));
        assert_eq!(set.visit_counts, visit_counts(&records));
        assert_eq!(set.longest_streaks, longest_streaks(&records));
        assert_eq!(set.longest_gaps, longest_gaps(&records));
        assert_eq!(set.top_visitor_per_course, top_visitor_per_course(&records));
        assert_eq!(
            set.multi_course_window,
            multi_course_window(&records, DEFAULT_WINDOW_DAYS)
        );
    }

    #[tokio::test]
    async fn generate_on_empty_table_is_empty() {
        let shared: Arc<[VisitRecord]> = Arc::from(Vec::<VisitRecord>::new());
        let set = generate(shared, DEFAULT_WINDOW_DAYS).await.unwrap();
        assert_eq!(set, ReportSet::default());
    }
}
