//! Employee records loaded from a CSV file

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use super::{DeptInfo, EmployeeLookup, EmployeeRecord, LeaveInfo, ManagerInfo};
use crate::error::Result;

const NOT_AVAILABLE: &str = "N/A";

/// In-memory employee table
#[derive(Debug, Clone, Default)]
pub struct CsvEmployeeStore {
    records: Vec<EmployeeRecord>,
    by_id: HashMap<String, usize>,
}

impl CsvEmployeeStore {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} employee records from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse CSV with a header row; cells are trimmed
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .deserialize::<EmployeeRecord>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::from_records(records))
    }

    /// The first row wins when ids repeat
    pub fn from_records(records: Vec<EmployeeRecord>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            by_id.entry(record.emp_id.clone()).or_insert(i);
        }
        Self { records, by_id }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, emp_id: &str) -> Option<&EmployeeRecord> {
        self.by_id.get(emp_id.trim()).map(|&i| &self.records[i])
    }

    /// Case-insensitive substring match on the name
    pub fn search_by_name(&self, name: &str) -> Vec<EmployeeRecord> {
        let needle = name.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on the department
    pub fn employees_in_department(&self, department: &str) -> Vec<EmployeeRecord> {
        let needle = department.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.department.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }
}

impl EmployeeLookup for CsvEmployeeStore {
    fn get_record(&self, emp_id: &str) -> Option<EmployeeRecord> {
        self.record(emp_id).cloned()
    }

    fn get_leave_balance(&self, emp_id: &str) -> Option<LeaveInfo> {
        self.record(emp_id).map(|r| LeaveInfo {
            name: r.name.clone(),
            casual_leave: r.casual_leave,
            sick_leave: r.sick_leave,
            earned_leave: r.earned_leave,
            total: r.casual_leave + r.sick_leave + r.earned_leave,
        })
    }

    fn get_manager(&self, emp_id: &str) -> Option<ManagerInfo> {
        let record = self.record(emp_id)?;
        let manager = self.records.iter().find(|r| r.name == record.manager);

        Some(match manager {
            Some(m) => ManagerInfo {
                manager_name: record.manager.clone(),
                email: m.email.clone(),
                phone: m.phone.clone(),
                role: m.role.clone(),
            },
            None => ManagerInfo {
                manager_name: record.manager.clone(),
                email: NOT_AVAILABLE.to_string(),
                phone: NOT_AVAILABLE.to_string(),
                role: NOT_AVAILABLE.to_string(),
            },
        })
    }

    fn get_department(&self, emp_id: &str) -> Option<DeptInfo> {
        let record = self.record(emp_id)?;
        let team_size = self
            .records
            .iter()
            .filter(|r| r.department == record.department)
            .count();

        Some(DeptInfo {
            department: record.department.clone(),
            role: record.role.clone(),
            manager: record.manager.clone(),
            team_size,
            joining_date: record.joining_date.clone(),
        })
    }

    fn all_employee_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.emp_id.clone()).collect()
    }
}
