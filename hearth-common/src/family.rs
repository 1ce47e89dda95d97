//! Household model: members and their tasks
//!
//! Every mutating operation names the acting member and checks the needed
//! capability through [`AccessControl`] before touching any state.

use crate::access::{AccessControl, Grants, Permission, PermissionSet, Role};
use crate::badge::due_badge_opt;
use crate::recurrence::{next_occurrence, Recurrence};
use crate::time::iso_date_opt;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Household member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub grants: Grants,
}

impl Member {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            grants: Grants::default(),
        }
    }

    pub fn permissions(&self) -> PermissionSet {
        self.grants.effective(self.role)
    }

    pub fn can(&self, permission: Permission) -> bool {
        AccessControl::allows(self.role, &self.grants, permission)
    }

    pub fn require(&self, permission: Permission) -> Result<()> {
        AccessControl::require(self.role, &self.grants, permission)
    }

    /// Actions on owners are reserved to owners, whatever has been granted
    fn require_owner(&self, action: &str) -> Result<()> {
        if self.role == Role::Owner {
            return Ok(());
        }
        Err(Error::PermissionDenied {
            role: self.role.to_string(),
            permission: action.to_string(),
        })
    }
}

/// A household task, optionally recurring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Uuid>,
    #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    /// Date a recurring task was last marked done
    #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<NaiveDate>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
}

impl Task {
    /// Due date to show: next occurrence for recurring tasks, stored date otherwise
    pub fn effective_due(&self, today: NaiveDate) -> Option<NaiveDate> {
        if self.recurrence.active_pattern().is_some() {
            next_occurrence(&self.recurrence, today)
        } else {
            self.due_date
        }
    }
}

/// Input for [`Household::create_task`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub assignee: Option<Uuid>,
    #[serde(default, with = "iso_date_opt")]
    pub due_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub recurrence: Recurrence,
}

/// Outcome of completing a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Task is closed
    Done,
    /// Recurring task stays open; next due on this date
    Recurs(NaiveDate),
}

/// Row of the upcoming-task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingTask {
    pub task_id: Uuid,
    pub title: String,
    pub assignee: Option<Uuid>,
    #[serde(with = "iso_date_opt")]
    pub due: Option<NaiveDate>,
    pub badge: String,
}

/// Members and tasks of one family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
}

impl Household {
    /// New household whose only member is its owner
    pub fn bootstrap(owner_name: impl Into<String>) -> (Self, Uuid) {
        let owner = Member::new(owner_name, Role::Owner);
        let owner_id = owner.id;
        info!(owner = %owner.name, "Household created");
        (
            Self {
                members: vec![owner],
                tasks: Vec::new(),
            },
            owner_id,
        )
    }

    pub fn member(&self, id: Uuid) -> Result<&Member> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))
    }

    fn member_mut(&mut self, id: Uuid) -> Result<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))
    }

    pub fn task(&self, id: Uuid) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))
    }

    fn owner_count(&self) -> usize {
        self.members.iter().filter(|m| m.role == Role::Owner).count()
    }

    pub fn add_member(&mut self, actor: Uuid, name: impl Into<String>, role: Role) -> Result<Uuid> {
        let acting = self.member(actor)?;
        acting.require(Permission::ManageMembers)?;
        if role == Role::Owner {
            acting.require_owner("add an owner")?;
        }

        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("member name is empty".to_string()));
        }

        let member = Member::new(name, role);
        let id = member.id;
        info!(member = %member.name, role = %role, "Member added");
        self.members.push(member);
        Ok(id)
    }

    /// Remove a member; their tasks become unassigned
    pub fn remove_member(&mut self, actor: Uuid, id: Uuid) -> Result<Member> {
        let acting = self.member(actor)?;
        acting.require(Permission::ManageMembers)?;

        let target = self.member(id)?;
        if target.role == Role::Owner {
            acting.require_owner("remove an owner")?;
        }
        if target.role == Role::Owner && self.owner_count() == 1 {
            return Err(Error::InvalidInput(
                "cannot remove the last owner".to_string(),
            ));
        }

        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("member {}", id)))?;
        let removed = self.members.remove(index);

        for task in self.tasks.iter_mut().filter(|t| t.assignee == Some(id)) {
            task.assignee = None;
        }

        info!(member = %removed.name, "Member removed");
        Ok(removed)
    }

    /// Change a member's role; only owners may promote to or demote from `Owner`
    pub fn change_role(&mut self, actor: Uuid, id: Uuid, role: Role) -> Result<()> {
        let acting = self.member(actor)?;
        acting.require(Permission::ManageRoles)?;

        let current = self.member(id)?.role;
        if current == Role::Owner || role == Role::Owner {
            acting.require_owner("change an owner's role")?;
        }
        if current == Role::Owner && role != Role::Owner && self.owner_count() == 1 {
            return Err(Error::InvalidInput(
                "cannot demote the last owner".to_string(),
            ));
        }

        let member = self.member_mut(id)?;
        member.role = role;
        info!(member = %member.name, from = %current, to = %role, "Role changed");
        Ok(())
    }

    pub fn grant(&mut self, actor: Uuid, id: Uuid, permission: Permission) -> Result<()> {
        self.member(actor)?.require(Permission::ManageRoles)?;
        let member = self.member_mut(id)?;
        member.grants.grant(permission);
        info!(member = %member.name, permission = %permission, "Permission granted");
        Ok(())
    }

    pub fn revoke(&mut self, actor: Uuid, id: Uuid, permission: Permission) -> Result<()> {
        self.member(actor)?.require(Permission::ManageRoles)?;
        let member = self.member_mut(id)?;
        member.grants.revoke(permission);
        info!(member = %member.name, permission = %permission, "Permission revoked");
        Ok(())
    }

    pub fn create_task(&mut self, actor: Uuid, new_task: NewTask) -> Result<Uuid> {
        let acting = self.member(actor)?;
        acting.require(Permission::CreateTasks)?;

        if let Some(assignee) = new_task.assignee {
            self.member(assignee)?;
            if assignee != actor {
                acting.require(Permission::AssignTasks)?;
            }
        }

        if new_task.title.trim().is_empty() {
            return Err(Error::InvalidInput("task title is empty".to_string()));
        }
        if let Some(pattern) = new_task.recurrence.active_pattern() {
            pattern.validate()?;
        } else if new_task.recurrence.is_recurring {
            return Err(Error::InvalidInput(
                "recurring task needs a recurrence pattern".to_string(),
            ));
        }

        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title,
            assignee: new_task.assignee,
            due_date: new_task.due_date,
            completed: false,
            last_completed: None,
            recurrence: new_task.recurrence,
        };
        let id = task.id;
        info!(task = %task.title, recurring = task.recurrence.is_recurring, "Task created");
        self.tasks.push(task);
        Ok(id)
    }

    /// Mark a task done on `today`.
    ///
    /// Recurring tasks stay open while another occurrence exists.
    pub fn complete_task(&mut self, actor: Uuid, id: Uuid, today: NaiveDate) -> Result<Completion> {
        let acting = self.member(actor)?;
        acting.require(Permission::CompleteTasks)?;

        let task = self.task(id)?;
        if task.completed {
            return Err(Error::InvalidInput(format!("task already completed: {}", task.title)));
        }
        if task.assignee.is_some_and(|assignee| assignee != actor) {
            acting.require(Permission::AssignTasks)?;
        }

        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;

        if task.recurrence.active_pattern().is_some() {
            task.last_completed = Some(today);
            if let Some(next) = next_occurrence(&task.recurrence, today) {
                info!(task = %task.title, next = %next, "Recurring task completed");
                return Ok(Completion::Recurs(next));
            }
        }

        task.completed = true;
        info!(task = %task.title, "Task completed");
        Ok(Completion::Done)
    }

    /// Open tasks with due dates and badges, soonest first, undated last
    pub fn upcoming(&self, today: NaiveDate) -> Vec<UpcomingTask> {
        let mut rows: Vec<UpcomingTask> = self
            .tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| {
                let due = t.effective_due(today);
                UpcomingTask {
                    task_id: t.id,
                    title: t.title.clone(),
                    assignee: t.assignee,
                    due,
                    badge: due_badge_opt(due, today),
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.due.is_none(), a.due, &a.title).cmp(&(b.due.is_none(), b.due, &b.title))
        });
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurringPattern};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn family() -> (Household, Uuid, Uuid, Uuid) {
        let (mut household, owner) = Household::bootstrap("Alex");
        let parent = household.add_member(owner, "Sam", Role::Parent).unwrap();
        let child = household.add_member(owner, "Kit", Role::Child).unwrap();
        (household, owner, parent, child)
    }

    fn chore(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    #[test]
    fn test_bootstrap_has_one_owner() {
        let (household, owner) = Household::bootstrap("Alex");
        assert_eq!(household.members.len(), 1);
        assert_eq!(household.member(owner).unwrap().role, Role::Owner);
    }

    #[test]
    fn test_child_cannot_add_members() {
        let (mut household, _, _, child) = family();
        let err = household.add_member(child, "Friend", Role::Guest).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[test]
    fn test_only_owner_adds_owner() {
        let (mut household, owner, parent, _) = family();
        assert!(household.add_member(parent, "Co", Role::Owner).is_err());
        assert!(household.add_member(owner, "Co", Role::Owner).is_ok());
    }

    #[test]
    fn test_last_owner_is_protected() {
        let (mut household, owner, parent, _) = family();
        assert!(matches!(
            household.change_role(owner, owner, Role::Parent),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            household.remove_member(owner, owner),
            Err(Error::InvalidInput(_))
        ));
        // Parents cannot change roles at all
        assert!(matches!(
            household.change_role(parent, owner, Role::Guest),
            Err(Error::PermissionDenied { .. })
        ));
    }

    #[test]
    fn test_delegated_role_manager_cannot_touch_owners() {
        let (mut household, owner, parent, child) = family();
        household.grant(owner, parent, Permission::ManageRoles).unwrap();

        assert!(matches!(
            household.change_role(parent, parent, Role::Owner),
            Err(Error::PermissionDenied { .. })
        ));
        assert!(matches!(
            household.change_role(parent, owner, Role::Guest),
            Err(Error::PermissionDenied { .. })
        ));
        assert_eq!(household.member(parent).unwrap().role, Role::Parent);
        assert_eq!(household.member(owner).unwrap().role, Role::Owner);

        // Non-owner roles are still theirs to manage
        household.change_role(parent, child, Role::Teen).unwrap();
        assert_eq!(household.member(child).unwrap().role, Role::Teen);
    }

    #[test]
    fn test_only_owner_removes_co_owner() {
        let (mut household, owner, parent, _) = family();
        let co_owner = household.add_member(owner, "Jo", Role::Owner).unwrap();

        assert!(matches!(
            household.remove_member(parent, co_owner),
            Err(Error::PermissionDenied { .. })
        ));
        assert!(household.member(co_owner).is_ok());

        household.remove_member(owner, co_owner).unwrap();
        assert!(household.member(co_owner).is_err());
    }

    #[test]
    fn test_removed_member_tasks_become_unassigned() {
        let (mut household, owner, _, child) = family();
        let task = household
            .create_task(
                owner,
                NewTask {
                    assignee: Some(child),
                    ..chore("Feed the cat")
                },
            )
            .unwrap();
        household.remove_member(owner, child).unwrap();
        assert_eq!(household.task(task).unwrap().assignee, None);
        assert!(household.member(child).is_err());
    }

    #[test]
    fn test_grant_lets_child_create_tasks() {
        let (mut household, owner, _, child) = family();
        assert!(household.create_task(child, chore("Build fort")).is_err());
        household.grant(owner, child, Permission::CreateTasks).unwrap();
        assert!(household.create_task(child, chore("Build fort")).is_ok());
        household.revoke(owner, child, Permission::CreateTasks).unwrap();
        assert!(!household.member(child).unwrap().can(Permission::CreateTasks));
    }

    #[test]
    fn test_assigning_to_others_needs_assign_permission() {
        let (mut household, owner, parent, _) = family();
        let teen = household.add_member(owner, "Robin", Role::Teen).unwrap();
        let result = household.create_task(
            teen,
            NewTask {
                assignee: Some(parent),
                ..chore("Groceries")
            },
        );
        assert!(matches!(result, Err(Error::PermissionDenied { .. })));

        let own = household.create_task(
            teen,
            NewTask {
                assignee: Some(teen),
                ..chore("Homework")
            },
        );
        assert!(own.is_ok());
    }

    #[test]
    fn test_create_task_validates_recurrence() {
        let (mut household, owner, _, _) = family();
        let bad = NewTask {
            recurrence: Recurrence::every(RecurringPattern::new(Frequency::Daily, 0)),
            ..chore("Water plants")
        };
        assert!(matches!(household.create_task(owner, bad), Err(Error::InvalidInput(_))));

        let missing = NewTask {
            recurrence: Recurrence {
                is_recurring: true,
                recurring_pattern: None,
            },
            ..chore("Water plants")
        };
        assert!(household.create_task(owner, missing).is_err());
    }

    #[test]
    fn test_complete_recurring_task_stays_open() {
        let (mut household, owner, _, child) = family();
        let today = date(2026, 1, 14);
        let task = household
            .create_task(
                owner,
                NewTask {
                    assignee: Some(child),
                    recurrence: Recurrence::every(
                        RecurringPattern::new(Frequency::Weekly, 1).with_days(&[1, 4]),
                    ),
                    ..chore("Take out bins")
                },
            )
            .unwrap();

        let outcome = household.complete_task(child, task, today).unwrap();
        assert_eq!(outcome, Completion::Recurs(date(2026, 1, 15)));
        let stored = household.task(task).unwrap();
        assert!(!stored.completed);
        assert_eq!(stored.last_completed, Some(today));
    }

    #[test]
    fn test_complete_recurring_task_after_end_date_closes_it() {
        let (mut household, owner, _, _) = family();
        let task = household
            .create_task(
                owner,
                NewTask {
                    recurrence: Recurrence::every(
                        RecurringPattern::new(Frequency::Daily, 1).until(date(2026, 1, 1)),
                    ),
                    ..chore("Holiday prep")
                },
            )
            .unwrap();
        let outcome = household.complete_task(owner, task, date(2026, 1, 10)).unwrap();
        assert_eq!(outcome, Completion::Done);
        assert!(household.task(task).unwrap().completed);
        assert!(household.complete_task(owner, task, date(2026, 1, 10)).is_err());
    }

    #[test]
    fn test_child_cannot_complete_someone_elses_task() {
        let (mut household, owner, parent, child) = family();
        let task = household
            .create_task(
                owner,
                NewTask {
                    assignee: Some(parent),
                    ..chore("Pay bills")
                },
            )
            .unwrap();
        assert!(matches!(
            household.complete_task(child, task, date(2026, 1, 10)),
            Err(Error::PermissionDenied { .. })
        ));
        assert_eq!(
            household.complete_task(parent, task, date(2026, 1, 10)).unwrap(),
            Completion::Done
        );
    }

    #[test]
    fn test_upcoming_sorted_with_badges() {
        let (mut household, owner, _, _) = family();
        let today = date(2026, 1, 10);
        household
            .create_task(
                owner,
                NewTask {
                    due_date: Some(date(2026, 1, 20)),
                    ..chore("Dentist")
                },
            )
            .unwrap();
        household.create_task(owner, chore("Someday")).unwrap();
        household
            .create_task(
                owner,
                NewTask {
                    recurrence: Recurrence::every(RecurringPattern::new(Frequency::Daily, 1)),
                    ..chore("Walk dog")
                },
            )
            .unwrap();

        let rows = household.upcoming(today);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Walk dog", "Dentist", "Someday"]);
        assert_eq!(rows[0].badge, "Tomorrow");
        assert_eq!(rows[1].badge, "Next week");
        assert_eq!(rows[2].badge, "No due date");
    }

    #[test]
    fn test_task_json_uses_camel_case() {
        let (mut household, owner, _, _) = family();
        let id = household
            .create_task(
                owner,
                NewTask {
                    recurrence: Recurrence::every(RecurringPattern::new(Frequency::Monthly, 2)),
                    ..chore("Change filters")
                },
            )
            .unwrap();
        let json = serde_json::to_value(household.task(id).unwrap()).unwrap();
        assert_eq!(json["isRecurring"], true);
        assert_eq!(json["recurringPattern"]["frequency"], "monthly");
        assert_eq!(json["recurringPattern"]["interval"], 2);
    }
}
