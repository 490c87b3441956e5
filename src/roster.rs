//! Departments, employees and their tasks, joined from the backend's flat lists

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, warn};

use crate::api::{split_timestamp, DepartmentDto, EmployeeDto, TaskDto};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskColor {
    Red,
    Green,
    Blue,
}

impl TaskColor {
    /// Stable color per task id so re-fetches don't reshuffle the board
    pub fn for_id(id: &str) -> Self {
        let sum: u32 = id.bytes().map(u32::from).sum();
        match sum % 3 {
            0 => TaskColor::Red,
            1 => TaskColor::Green,
            _ => TaskColor::Blue,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Display start time, e.g. "2:00 PM"
    pub time: String,
    pub end_time: Option<String>,
    pub date: NaiveDate,
    pub assigned_to_employee_id: Option<String>,
    pub employee_name: Option<String>,
    pub department_id: Option<String>,
    pub color: TaskColor,
}

impl Task {
    /// Convert a wire task; tasks without a usable start timestamp are dropped
    pub fn from_dto(dto: TaskDto) -> Option<Self> {
        let Some((date, time)) = dto.start_time.as_deref().and_then(split_timestamp) else {
            warn!(task_id = %dto.id, "Skipping task without a valid start time");
            return None;
        };
        let end_time = dto
            .end_time
            .as_deref()
            .and_then(split_timestamp)
            .map(|(_, t)| t);

        Some(Self {
            color: TaskColor::for_id(&dto.id),
            id: dto.id,
            title: dto.title,
            description: dto.description.unwrap_or_default(),
            time,
            end_time,
            date,
            assigned_to_employee_id: dto.assigned_to_employee_id,
            employee_name: None,
            department_id: dto.department_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub position: String,
    pub avatar_url: Option<String>,
    pub department: Option<String>,
    pub tasks: Vec<Task>,
}

impl Employee {
    fn from_dto(dto: EmployeeDto, origin: &str) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            position: dto.job_title.unwrap_or_else(|| "Employee".to_string()),
            avatar_url: dto
                .image_path
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}{}", origin.trim_end_matches('/'), p)),
            department: dto.department,
            tasks: Vec::new(),
        }
    }

    pub fn tasks_on(&self, date: NaiveDate) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.date == date)
    }

    pub fn has_tasks_on(&self, date: NaiveDate) -> bool {
        self.tasks_on(date).next().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub employees: Vec<Employee>,
}

impl Department {
    pub fn employee(&self, id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    pub fn employees_with_tasks_on(&self, date: NaiveDate) -> impl Iterator<Item = &Employee> {
        self.employees.iter().filter(move |e| e.has_tasks_on(date))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub departments: Vec<Department>,
}

impl Roster {
    /// Join departments, their employees and the global task list.
    ///
    /// `employees` pairs a department id with the employees the backend returned
    /// for it. Tasks are attached by `assigned_to_employee_id`; unassigned tasks
    /// are not shown on anyone's lane.
    pub fn assemble(
        departments: Vec<DepartmentDto>,
        employees: Vec<(String, Vec<EmployeeDto>)>,
        tasks: Vec<TaskDto>,
        origin: &str,
    ) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().filter_map(Task::from_dto).collect();

        let departments = departments
            .into_iter()
            .map(|dept| {
                let employees = employees
                    .iter()
                    .filter(|(dept_id, _)| *dept_id == dept.id)
                    .flat_map(|(_, list)| list.iter().cloned())
                    .map(|dto| {
                        let mut employee = Employee::from_dto(dto, origin);
                        employee.tasks = tasks
                            .iter()
                            .filter(|t| t.assigned_to_employee_id.as_deref() == Some(employee.id.as_str()))
                            .cloned()
                            .map(|mut t| {
                                t.employee_name = Some(employee.name.clone());
                                t
                            })
                            .collect();
                        employee
                    })
                    .collect();
                Department {
                    id: dept.id,
                    name: dept.name,
                    employees,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            departments = departments.len(),
            tasks = tasks.len(),
            "Assembled roster"
        );

        Self { departments }
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.id == id)
    }

    pub fn employee(&self, department_id: &str, employee_id: &str) -> Option<&Employee> {
        self.department(department_id)?.employee(employee_id)
    }

    /// Replace or insert a task on every employee it is assigned to
    pub fn upsert_task(&mut self, task: Task) {
        self.remove_task(&task.id);
        let Some(assignee) = task.assigned_to_employee_id.clone() else {
            return;
        };
        for employee in self
            .departments
            .iter_mut()
            .flat_map(|d| d.employees.iter_mut())
            .filter(|e| e.id == assignee)
        {
            let mut task = task.clone();
            task.employee_name = Some(employee.name.clone());
            employee.tasks.push(task);
        }
    }

    pub fn remove_task(&mut self, task_id: &str) {
        for employee in self.departments.iter_mut().flat_map(|d| d.employees.iter_mut()) {
            employee.tasks.retain(|t| t.id != task_id);
        }
    }
}

/// Sunday-based week containing `anchor`, shifted by `week_offset` weeks
pub fn week_days(anchor: NaiveDate, week_offset: i32) -> Vec<NaiveDate> {
    let shifted = anchor + Duration::weeks(week_offset as i64);
    let start = shifted - Duration::days(shifted.weekday().num_days_from_sunday() as i64);
    (0..7).map(|i| start + Duration::days(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn dept(id: &str, name: &str) -> DepartmentDto {
        DepartmentDto {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn emp(id: &str, name: &str) -> EmployeeDto {
        EmployeeDto {
            id: id.to_string(),
            name: name.to_string(),
            job_title: None,
            image_path: Some("/uploads/a.png".to_string()),
            department: None,
        }
    }

    fn task(id: &str, start: &str, assignee: Option<&str>) -> TaskDto {
        TaskDto {
            id: id.to_string(),
            title: format!("task {}", id),
            description: None,
            start_time: Some(start.to_string()),
            end_time: None,
            department_id: None,
            assigned_to_employee_id: assignee.map(str::to_string),
        }
    }

    fn roster() -> Roster {
        Roster::assemble(
            vec![dept("1", "Sales"), dept("2", "Ops")],
            vec![
                ("1".to_string(), vec![emp("10", "Mona"), emp("11", "Karim")]),
                ("2".to_string(), vec![emp("20", "Lea")]),
            ],
            vec![
                task("100", "2025-05-20T10:00:00", Some("10")),
                task("101", "2025-05-21T11:00:00", Some("10")),
                task("102", "2025-05-20T12:00:00", Some("20")),
                task("103", "2025-05-20T12:00:00", None),
                task("104", "", Some("11")),
            ],
            "http://backend.test",
        )
    }

    #[test]
    fn tasks_join_by_assignee() {
        let roster = roster();
        let mona = roster.employee("1", "10").unwrap();
        assert_eq!(mona.tasks.len(), 2);
        assert!(mona.tasks.iter().all(|t| t.employee_name.as_deref() == Some("Mona")));
        assert_eq!(mona.position, "Employee");
        assert_eq!(mona.avatar_url.as_deref(), Some("http://backend.test/uploads/a.png"));

        // Unassigned and unparseable tasks end up nowhere
        let karim = roster.employee("1", "11").unwrap();
        assert!(karim.tasks.is_empty());
        let total: usize = roster
            .departments
            .iter()
            .flat_map(|d| &d.employees)
            .map(|e| e.tasks.len())
            .sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn employees_with_tasks_on_a_day() {
        let roster = roster();
        let sales = roster.department("1").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let names: Vec<&str> = sales.employees_with_tasks_on(day).map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Mona"]);
    }

    #[test]
    fn upsert_moves_task_between_employees() {
        let mut roster = roster();
        let mut moved = roster.employee("1", "10").unwrap().tasks[0].clone();
        moved.assigned_to_employee_id = Some("11".to_string());
        roster.upsert_task(moved);

        assert_eq!(roster.employee("1", "10").unwrap().tasks.len(), 1);
        let karim = roster.employee("1", "11").unwrap();
        assert_eq!(karim.tasks.len(), 1);
        assert_eq!(karim.tasks[0].employee_name.as_deref(), Some("Karim"));

        roster.remove_task("100");
        assert!(roster.employee("1", "11").unwrap().tasks.is_empty());
    }

    #[test]
    fn task_colors_are_stable() {
        assert_eq!(TaskColor::for_id("100"), TaskColor::for_id("100"));
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2025-05-20 is a Tuesday
        let days = week_days(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(), 0);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2025, 5, 18).unwrap());
        assert_eq!(days[0].weekday(), Weekday::Sun);
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2025, 5, 24).unwrap());

        let prev = week_days(NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(), -1);
        assert_eq!(prev[0], NaiveDate::from_ymd_opt(2025, 5, 11).unwrap());
    }
}
