//! Employee record lookup

mod context;
mod csv_store;

pub use context::{build_employee_context, EmployeeTopic};
pub use csv_store::CsvEmployeeStore;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the employee data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(rename = "EmpID")]
    pub emp_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Role")]
    pub role: String,
    /// Manager's name
    #[serde(rename = "Manager")]
    pub manager: String,
    #[serde(rename = "JoiningDate")]
    pub joining_date: String,
    #[serde(rename = "CasualLeave", default, deserialize_with = "blank_as_zero")]
    pub casual_leave: u32,
    #[serde(rename = "SickLeave", default, deserialize_with = "blank_as_zero")]
    pub sick_leave: u32,
    #[serde(rename = "EarnedLeave", default, deserialize_with = "blank_as_zero")]
    pub earned_leave: u32,
}

/// Empty leave cells count as zero days
fn blank_as_zero<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

/// Remaining leave for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveInfo {
    pub name: String,
    pub casual_leave: u32,
    pub sick_leave: u32,
    pub earned_leave: u32,
    pub total: u32,
}

/// Contact details of an employee's manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerInfo {
    pub manager_name: String,
    pub email: String,
    pub phone: String,
    pub role: String,
}

/// Placement of an employee in the organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeptInfo {
    pub department: String,
    pub role: String,
    pub manager: String,
    pub team_size: usize,
    pub joining_date: String,
}

/// Read-only access to employee records keyed by id
pub trait EmployeeLookup: Send + Sync {
    fn get_record(&self, emp_id: &str) -> Option<EmployeeRecord>;

    fn get_leave_balance(&self, emp_id: &str) -> Option<LeaveInfo>;

    fn get_manager(&self, emp_id: &str) -> Option<ManagerInfo>;

    fn get_department(&self, emp_id: &str) -> Option<DeptInfo>;

    fn all_employee_ids(&self) -> Vec<String>;
}
