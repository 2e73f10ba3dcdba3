//! Filtering and sorting inputs for the `todos` query.
//!
//! Input names and operators follow the conventions GraphQL clients of this
//! API already use (`where: { title: { contains: "x" } }`,
//! `order: [{ priority: DESC }]`). Both are evaluated over the caller's own
//! todos after they are loaded.

use std::cmp::Ordering;

use async_graphql::{Enum, InputObject, MaybeUndefined};
use chrono::{DateTime, Utc};

use crate::models::todo::{Priority, TodoItem};

#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "IntOperationFilterInput")]
pub struct IntFilter {
    pub eq: Option<i32>,
    pub neq: Option<i32>,
    #[graphql(name = "in")]
    pub in_list: Option<Vec<i32>>,
    #[graphql(name = "nin")]
    pub not_in_list: Option<Vec<i32>>,
    pub gt: Option<i32>,
    pub gte: Option<i32>,
    pub lt: Option<i32>,
    pub lte: Option<i32>,
}

impl IntFilter {
    fn matches(&self, value: i32) -> bool {
        self.eq.map_or(true, |eq| value == eq)
            && self.neq.map_or(true, |neq| value != neq)
            && self.in_list.as_ref().map_or(true, |list| list.contains(&value))
            && self.not_in_list.as_ref().map_or(true, |list| !list.contains(&value))
            && self.gt.map_or(true, |gt| value > gt)
            && self.gte.map_or(true, |gte| value >= gte)
            && self.lt.map_or(true, |lt| value < lt)
            && self.lte.map_or(true, |lte| value <= lte)
    }
}

#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "StringOperationFilterInput")]
pub struct StringFilter {
    pub eq: Option<String>,
    pub neq: Option<String>,
    pub contains: Option<String>,
    #[graphql(name = "ncontains")]
    pub not_contains: Option<String>,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    #[graphql(name = "in")]
    pub in_list: Option<Vec<String>>,
    #[graphql(name = "nin")]
    pub not_in_list: Option<Vec<String>>,
}

impl StringFilter {
    fn matches(&self, value: &str) -> bool {
        self.eq.as_deref().map_or(true, |eq| value == eq)
            && self.neq.as_deref().map_or(true, |neq| value != neq)
            && self.contains.as_deref().map_or(true, |part| value.contains(part))
            && self.not_contains.as_deref().map_or(true, |part| !value.contains(part))
            && self.starts_with.as_deref().map_or(true, |prefix| value.starts_with(prefix))
            && self.ends_with.as_deref().map_or(true, |suffix| value.ends_with(suffix))
            && self
                .in_list
                .as_ref()
                .map_or(true, |list| list.iter().any(|item| item == value))
            && self
                .not_in_list
                .as_ref()
                .map_or(true, |list| list.iter().all(|item| item != value))
    }
}

#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "BooleanOperationFilterInput")]
pub struct BooleanFilter {
    pub eq: Option<bool>,
    pub neq: Option<bool>,
}

impl BooleanFilter {
    fn matches(&self, value: bool) -> bool {
        self.eq.map_or(true, |eq| value == eq) && self.neq.map_or(true, |neq| value != neq)
    }
}

#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "TodoPriorityOperationFilterInput")]
pub struct PriorityFilter {
    pub eq: Option<Priority>,
    pub neq: Option<Priority>,
    #[graphql(name = "in")]
    pub in_list: Option<Vec<Priority>>,
    #[graphql(name = "nin")]
    pub not_in_list: Option<Vec<Priority>>,
}

impl PriorityFilter {
    fn matches(&self, value: Priority) -> bool {
        self.eq.map_or(true, |eq| value == eq)
            && self.neq.map_or(true, |neq| value != neq)
            && self.in_list.as_ref().map_or(true, |list| list.contains(&value))
            && self.not_in_list.as_ref().map_or(true, |list| !list.contains(&value))
    }
}

/// `eq: null` and `neq: null` test for an unset timestamp. Range operators
/// never match an unset one.
#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "DateTimeOperationFilterInput")]
pub struct DateTimeFilter {
    pub eq: MaybeUndefined<DateTime<Utc>>,
    pub neq: MaybeUndefined<DateTime<Utc>>,
    pub gt: Option<DateTime<Utc>>,
    pub gte: Option<DateTime<Utc>>,
    pub lt: Option<DateTime<Utc>>,
    pub lte: Option<DateTime<Utc>>,
}

impl DateTimeFilter {
    fn matches(&self, value: Option<DateTime<Utc>>) -> bool {
        let eq = match &self.eq {
            MaybeUndefined::Undefined => true,
            MaybeUndefined::Null => value.is_none(),
            MaybeUndefined::Value(eq) => value == Some(*eq),
        };
        let neq = match &self.neq {
            MaybeUndefined::Undefined => true,
            MaybeUndefined::Null => value.is_some(),
            MaybeUndefined::Value(neq) => value != Some(*neq),
        };
        let range = |bound: Option<DateTime<Utc>>, accept: fn(&DateTime<Utc>, &DateTime<Utc>) -> bool| {
            bound.map_or(true, |bound| value.is_some_and(|value| accept(&value, &bound)))
        };
        eq && neq
            && range(self.gt, |value, bound| value > bound)
            && range(self.gte, |value, bound| value >= bound)
            && range(self.lt, |value, bound| value < bound)
            && range(self.lte, |value, bound| value <= bound)
    }
}

#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "TodoItemFilterInput")]
pub struct TodoFilter {
    pub and: Option<Vec<TodoFilter>>,
    pub or: Option<Vec<TodoFilter>>,
    pub id: Option<IntFilter>,
    pub title: Option<StringFilter>,
    pub description: Option<StringFilter>,
    pub is_completed: Option<BooleanFilter>,
    pub priority: Option<PriorityFilter>,
    pub start_at_utc: Option<DateTimeFilter>,
    pub end_at_utc: Option<DateTimeFilter>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &TodoItem) -> bool {
        self.and
            .as_ref()
            .map_or(true, |all| all.iter().all(|filter| filter.matches(todo)))
            && self
                .or
                .as_ref()
                .map_or(true, |any| any.iter().any(|filter| filter.matches(todo)))
            && self.id.as_ref().map_or(true, |f| f.matches(todo.id))
            && self.title.as_ref().map_or(true, |f| f.matches(&todo.title))
            && self
                .description
                .as_ref()
                .map_or(true, |f| f.matches(&todo.description))
            && self
                .is_completed
                .as_ref()
                .map_or(true, |f| f.matches(todo.is_completed))
            && self.priority.as_ref().map_or(true, |f| f.matches(todo.priority))
            && self
                .start_at_utc
                .as_ref()
                .map_or(true, |f| f.matches(todo.start_at_utc))
            && self
                .end_at_utc
                .as_ref()
                .map_or(true, |f| f.matches(todo.end_at_utc))
    }
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
#[graphql(name = "SortEnumType")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Unset timestamps sort after set ones when ascending.
fn compare_optional<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One entry of `order`; each set field is a sort key, in declaration order.
#[derive(InputObject, Debug, Clone, Default)]
#[graphql(name = "TodoItemSortInput")]
pub struct TodoSort {
    pub id: Option<SortDirection>,
    pub title: Option<SortDirection>,
    pub description: Option<SortDirection>,
    pub is_completed: Option<SortDirection>,
    pub priority: Option<SortDirection>,
    pub start_at_utc: Option<SortDirection>,
    pub end_at_utc: Option<SortDirection>,
}

impl TodoSort {
    fn compare(&self, a: &TodoItem, b: &TodoItem) -> Ordering {
        let keys: [(Option<SortDirection>, fn(&TodoItem, &TodoItem) -> Ordering); 7] = [
            (self.id, |a, b| a.id.cmp(&b.id)),
            (self.title, |a, b| a.title.cmp(&b.title)),
            (self.description, |a, b| a.description.cmp(&b.description)),
            (self.is_completed, |a, b| a.is_completed.cmp(&b.is_completed)),
            (self.priority, |a, b| a.priority.cmp(&b.priority)),
            (self.start_at_utc, |a, b| compare_optional(&a.start_at_utc, &b.start_at_utc)),
            (self.end_at_utc, |a, b| compare_optional(&a.end_at_utc, &b.end_at_utc)),
        ];
        keys.iter()
            .filter_map(|(direction, compare)| direction.map(|d| d.apply(compare(a, b))))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

pub fn sort_todos(todos: &mut [TodoItem], order: &[TodoSort]) {
    todos.sort_by(|a, b| {
        order
            .iter()
            .map(|sort| sort.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo(id: i32, title: &str, priority: Priority, start_hour: Option<u32>) -> TodoItem {
        let at = |hour| Utc.with_ymd_and_hms(2026, 2, 1, hour, 0, 0).unwrap();
        TodoItem {
            id,
            title: title.to_string(),
            description: String::new(),
            is_completed: id % 2 == 0,
            priority,
            start_at_utc: start_hour.map(at),
            end_at_utc: start_hour.map(|hour| at(hour + 1)),
            user_id: "alice".to_string(),
        }
    }

    fn sample() -> Vec<TodoItem> {
        vec![
            todo(1, "Buy milk", Priority::Low, Some(9)),
            todo(2, "Call mom", Priority::High, None),
            todo(3, "Buy bread", Priority::High, Some(8)),
            todo(4, "Write report", Priority::Medium, None),
        ]
    }

    fn ids(todos: &[TodoItem]) -> Vec<i32> {
        todos.iter().map(|todo| todo.id).collect()
    }

    fn filtered(filter: &TodoFilter) -> Vec<i32> {
        let todos: Vec<TodoItem> = sample().into_iter().filter(|t| filter.matches(t)).collect();
        ids(&todos)
    }

    #[test]
    fn string_operators() {
        let filter = TodoFilter {
            title: Some(StringFilter {
                starts_with: Some("Buy".to_string()),
                not_contains: Some("bread".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(filtered(&filter), vec![1]);
    }

    #[test]
    fn or_combines_alternatives() {
        let filter = TodoFilter {
            or: Some(vec![
                TodoFilter {
                    priority: Some(PriorityFilter {
                        eq: Some(Priority::Low),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                TodoFilter {
                    id: Some(IntFilter {
                        gte: Some(4),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert_eq!(filtered(&filter), vec![1, 4]);
    }

    #[test]
    fn null_equality_selects_unscheduled_todos() {
        let filter = TodoFilter {
            start_at_utc: Some(DateTimeFilter {
                eq: MaybeUndefined::Null,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(filtered(&filter), vec![2, 4]);
    }

    #[test]
    fn date_ranges_skip_unscheduled_todos() {
        let filter = TodoFilter {
            start_at_utc: Some(DateTimeFilter {
                gte: Some(Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0).unwrap()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(filtered(&filter), vec![1]);
    }

    #[test]
    fn boolean_and_priority_sets() {
        let filter = TodoFilter {
            and: Some(vec![TodoFilter {
                is_completed: Some(BooleanFilter {
                    eq: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            priority: Some(PriorityFilter {
                not_in_list: Some(vec![Priority::Medium]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(filtered(&filter), vec![2]);
    }

    #[test]
    fn sorts_by_priority_descending_then_id() {
        let mut todos = sample();
        sort_todos(
            &mut todos,
            &[TodoSort {
                priority: Some(SortDirection::Desc),
                ..Default::default()
            }],
        );
        assert_eq!(ids(&todos), vec![2, 3, 4, 1]);
    }

    #[test]
    fn unscheduled_todos_sort_last_ascending() {
        let mut todos = sample();
        sort_todos(
            &mut todos,
            &[TodoSort {
                start_at_utc: Some(SortDirection::Asc),
                ..Default::default()
            }],
        );
        assert_eq!(ids(&todos), vec![3, 1, 2, 4]);
    }

    #[test]
    fn later_order_entries_break_ties() {
        let mut todos = sample();
        sort_todos(
            &mut todos,
            &[
                TodoSort {
                    priority: Some(SortDirection::Asc),
                    ..Default::default()
                },
                TodoSort {
                    title: Some(SortDirection::Asc),
                    ..Default::default()
                },
            ],
        );
        assert_eq!(ids(&todos), vec![1, 4, 3, 2]);
    }
}
