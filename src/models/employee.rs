//! Employee model and related types.
//!
//! This module defines the Employee record owned by the employee directory,
//! together with the request shapes used to create and edit it.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ClockAction;

/// Id prefix reserved for employees created while the remote store was unreachable.
pub const OFFLINE_EMPLOYEE_PREFIX: &str = "offline_emp_";

/// Break policy cap applied when an employee has none configured, in minutes.
pub const DEFAULT_BREAK_DURATION_MINUTES: u32 = 30;

fn default_break_duration() -> u32 {
    DEFAULT_BREAK_DURATION_MINUTES
}

/// Gender of an employee. Only used to phrase greetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    /// Male.
    M,
    /// Female.
    F,
}

/// Represents an employee who can clock in and out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Job title or position.
    #[serde(default)]
    pub position: String,
    /// Optional gender used for greeting text.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Hourly pay rate, when salary figures should be shown.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Maximum automatic break deduction per shift, in minutes.
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,
    /// Scheduled start of the working day (informational).
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// Scheduled end of the working day (informational).
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Opaque reference to a profile picture.
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl Employee {
    /// Returns the break cap used for automatic deductions.
    ///
    /// A configured cap of zero falls back to the 30 minute default.
    ///
    /// # Examples
    ///
    /// ```
    /// use timeclock_engine::models::Employee;
    ///
    /// let mut employee: Employee = serde_json::from_str(r#"{"name": "Awa"}"#).unwrap();
    /// assert_eq!(employee.break_policy_minutes(), 30);
    ///
    /// employee.break_duration = 45;
    /// assert_eq!(employee.break_policy_minutes(), 45);
    /// ```
    pub fn break_policy_minutes(&self) -> u32 {
        if self.break_duration == 0 {
            DEFAULT_BREAK_DURATION_MINUTES
        } else {
            self.break_duration
        }
    }

    /// Returns true when the employee was created offline and not yet reconciled.
    pub fn is_offline(&self) -> bool {
        self.id.starts_with(OFFLINE_EMPLOYEE_PREFIX)
    }

    /// Returns the hourly rate when it is set and positive.
    pub fn billable_rate(&self) -> Option<Decimal> {
        self.hourly_rate.filter(|rate| *rate > Decimal::ZERO)
    }

    /// Greeting shown when the employee clocks in or out.
    pub fn greeting(&self, action: ClockAction) -> String {
        let title = match self.gender {
            Some(Gender::M) => "Mr. ",
            Some(Gender::F) => "Ms. ",
            None => "",
        };
        match action {
            ClockAction::ClockIn => format!("Welcome, {}{}", title, self.name),
            ClockAction::ClockOut => format!("Goodbye, {}{}", title, self.name),
        }
    }
}

/// Data supplied by an administrator to create an employee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    /// Display name.
    pub name: String,
    /// Job title or position.
    #[serde(default)]
    pub position: String,
    /// Optional gender used for greeting text.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Hourly pay rate.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    /// Break cap in minutes; the configured default applies when omitted.
    #[serde(default)]
    pub break_duration: Option<u32>,
    /// Scheduled start of the working day.
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// Scheduled end of the working day.
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Opaque reference to a profile picture.
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl NewEmployee {
    /// Builds the employee record, without an id, using `default_break` when no cap was given.
    pub fn into_employee(self, default_break: u32) -> Employee {
        Employee {
            id: String::new(),
            name: self.name,
            position: self.position,
            gender: self.gender,
            hourly_rate: self.hourly_rate,
            break_duration: self.break_duration.unwrap_or(default_break),
            start_time: self.start_time,
            end_time: self.end_time,
            profile_image: self.profile_image,
        }
    }
}

/// Partial update of an employee; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// New gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// New hourly rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Decimal>,
    /// New break cap in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub break_duration: Option<u32>,
    /// New scheduled start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    /// New scheduled end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    /// New profile picture reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl EmployeeUpdate {
    /// Applies the present fields to `employee`.
    pub fn apply(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(position) = &self.position {
            employee.position = position.clone();
        }
        if let Some(gender) = self.gender {
            employee.gender = Some(gender);
        }
        if let Some(rate) = self.hourly_rate {
            employee.hourly_rate = Some(rate);
        }
        if let Some(minutes) = self.break_duration {
            employee.break_duration = minutes;
        }
        if let Some(start) = self.start_time {
            employee.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            employee.end_time = Some(end);
        }
        if let Some(image) = &self.profile_image {
            employee.profile_image = Some(image.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Awa Diallo".to_string(),
            position: "Cashier".to_string(),
            gender: Some(Gender::F),
            hourly_rate: Some(Decimal::new(1500, 0)),
            break_duration: 30,
            start_time: NaiveTime::from_hms_opt(8, 0, 0),
            end_time: NaiveTime::from_hms_opt(17, 0, 0),
            profile_image: None,
        }
    }

    #[test]
    fn test_deserialize_minimal_employee_applies_defaults() {
        let json = r#"{ "id": "emp_002", "name": "Moussa" }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "emp_002");
        assert_eq!(employee.break_duration, DEFAULT_BREAK_DURATION_MINUTES);
        assert_eq!(employee.hourly_rate, None);
        assert_eq!(employee.gender, None);
        assert!(employee.position.is_empty());
    }

    #[test]
    fn test_deserialize_full_employee() {
        let json = r#"{
            "id": "emp_003",
            "name": "Fatou",
            "position": "Manager",
            "gender": "F",
            "hourly_rate": "2500.50",
            "break_duration": 45,
            "start_time": "08:30:00",
            "end_time": "17:30:00"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.gender, Some(Gender::F));
        assert_eq!(employee.hourly_rate, Some(Decimal::new(250050, 2)));
        assert_eq!(employee.break_duration, 45);
        assert_eq!(employee.start_time, NaiveTime::from_hms_opt(8, 30, 0));
    }

    #[test]
    fn test_zero_break_duration_falls_back_to_default() {
        let mut employee = create_test_employee();
        employee.break_duration = 0;
        assert_eq!(employee.break_policy_minutes(), 30);
    }

    #[test]
    fn test_billable_rate_ignores_zero_and_missing() {
        let mut employee = create_test_employee();
        assert_eq!(employee.billable_rate(), Some(Decimal::new(1500, 0)));

        employee.hourly_rate = Some(Decimal::ZERO);
        assert_eq!(employee.billable_rate(), None);

        employee.hourly_rate = None;
        assert_eq!(employee.billable_rate(), None);
    }

    #[test]
    fn test_offline_prefix_detection() {
        let mut employee = create_test_employee();
        assert!(!employee.is_offline());
        employee.id = format!("{}abc", OFFLINE_EMPLOYEE_PREFIX);
        assert!(employee.is_offline());
    }

    #[test]
    fn test_greeting_uses_gender_title() {
        let mut employee = create_test_employee();
        assert_eq!(
            employee.greeting(ClockAction::ClockIn),
            "Welcome, Ms. Awa Diallo"
        );

        employee.gender = Some(Gender::M);
        assert_eq!(
            employee.greeting(ClockAction::ClockOut),
            "Goodbye, Mr. Awa Diallo"
        );

        employee.gender = None;
        assert_eq!(employee.greeting(ClockAction::ClockIn), "Welcome, Awa Diallo");
    }

    #[test]
    fn test_new_employee_uses_default_break_when_missing() {
        let new = NewEmployee {
            name: "Ibrahima".to_string(),
            ..Default::default()
        };
        let employee = new.into_employee(20);
        assert_eq!(employee.break_duration, 20);
        assert!(employee.id.is_empty());
    }

    #[test]
    fn test_update_only_touches_present_fields() {
        let mut employee = create_test_employee();
        let update = EmployeeUpdate {
            position: Some("Supervisor".to_string()),
            break_duration: Some(60),
            ..Default::default()
        };

        update.apply(&mut employee);
        assert_eq!(employee.name, "Awa Diallo");
        assert_eq!(employee.position, "Supervisor");
        assert_eq!(employee.break_duration, 60);
    }
}
