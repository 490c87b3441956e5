//! Which department, employee and date the board is showing.
//!
//! Views that depend on the selection subscribe to a [`SelectionHub`] and are
//! called back synchronously whenever the selection actually changes.

use chrono::NaiveDate;
use tracing::debug;

use crate::layout::LayoutMode;
use crate::roster::week_days;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub department_id: Option<String>,
    pub employee_id: Option<String>,
    pub date: NaiveDate,
    pub week_offset: i32,
}

impl Selection {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            department_id: None,
            employee_id: None,
            date: today,
            week_offset: 0,
        }
    }

    /// A single employee gets the week grid; a department gets one day
    pub fn mode(&self) -> LayoutMode {
        if self.employee_id.is_some() {
            LayoutMode::WeekGrid
        } else {
            LayoutMode::SingleDay
        }
    }

    /// New tasks can't be scheduled into past weeks
    pub fn allows_task_creation(&self) -> bool {
        self.week_offset >= 0
    }

    pub fn visible_days(&self) -> Vec<NaiveDate> {
        match self.mode() {
            LayoutMode::WeekGrid => week_days(self.date, self.week_offset),
            LayoutMode::SingleDay => vec![self.date],
        }
    }
}

type Listener = Box<dyn FnMut(&Selection)>;

pub struct SelectionHub {
    current: Selection,
    listeners: Vec<Listener>,
}

impl SelectionHub {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current: Selection::new(today),
            listeners: Vec::new(),
        }
    }

    pub fn current(&self) -> &Selection {
        &self.current
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Selection) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Show the whole department for the selected day
    pub fn select_department(&mut self, department_id: &str) -> bool {
        let department_id = department_id.to_string();
        self.update(|s| {
            if s.employee_id.is_some() || s.department_id.as_deref() != Some(department_id.as_str()) {
                s.week_offset = 0;
            }
            s.department_id = Some(department_id);
            s.employee_id = None;
        })
    }

    pub fn select_employee(&mut self, department_id: &str, employee_id: &str) -> bool {
        let department_id = department_id.to_string();
        let employee_id = employee_id.to_string();
        self.update(|s| {
            if s.employee_id.as_deref() != Some(employee_id.as_str()) {
                s.week_offset = 0;
            }
            s.department_id = Some(department_id);
            s.employee_id = Some(employee_id);
        })
    }

    pub fn select_date(&mut self, date: NaiveDate) -> bool {
        self.update(|s| s.date = date)
    }

    pub fn next_week(&mut self) -> bool {
        self.update(|s| s.week_offset += 1)
    }

    pub fn previous_week(&mut self) -> bool {
        self.update(|s| s.week_offset -= 1)
    }

    pub fn current_week(&mut self) -> bool {
        self.update(|s| s.week_offset = 0)
    }

    /// Drop everything except the date, e.g. after a logout
    pub fn clear(&mut self) -> bool {
        self.update(|s| {
            s.department_id = None;
            s.employee_id = None;
            s.week_offset = 0;
        })
    }

    fn update(&mut self, change: impl FnOnce(&mut Selection)) -> bool {
        let mut next = self.current.clone();
        change(&mut next);
        if next == self.current {
            return false;
        }

        debug!(?next, "Selection changed");
        self.current = next;
        for listener in &mut self.listeners {
            listener(&self.current);
        }
        true
    }
}
