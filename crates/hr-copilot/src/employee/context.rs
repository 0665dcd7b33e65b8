//! Employee context blocks for the prompt

use super::EmployeeLookup;

/// Part of an employee record a question is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeTopic {
    Leave,
    Manager,
    Department,
}

impl EmployeeTopic {
    fn hints(&self) -> &'static [&'static str] {
        match self {
            Self::Leave => &["leave", "balance", "casual", "sick", "earned"],
            Self::Manager => &["manager", "supervisor", "boss"],
            Self::Department => &["department", "team", "role"],
        }
    }

    /// Topics hinted at by the query, in a fixed order
    pub fn detect(query: &str) -> Vec<Self> {
        let lowered = query.to_lowercase();
        [Self::Leave, Self::Manager, Self::Department]
            .into_iter()
            .filter(|topic| topic.hints().iter().any(|h| lowered.contains(h)))
            .collect()
    }
}

/// Build the employee context for `emp_id`, focused on what `query` asks about.
///
/// Without any topic hint the block is a basic identity summary.
pub fn build_employee_context(lookup: &dyn EmployeeLookup, emp_id: &str, query: &str) -> String {
    let Some(record) = lookup.get_record(emp_id) else {
        tracing::warn!("Employee {} not found", emp_id);
        return format!("Employee ID {} not found in the system.", emp_id);
    };

    let mut blocks = Vec::new();
    for topic in EmployeeTopic::detect(query) {
        let block = match topic {
            EmployeeTopic::Leave => lookup.get_leave_balance(emp_id).map(|leave| {
                format!(
                    "Leave Balance for {}:\n- Casual Leave: {} days\n- Sick Leave: {} days\n- Earned Leave: {} days\n- Total: {} days",
                    leave.name, leave.casual_leave, leave.sick_leave, leave.earned_leave, leave.total
                )
            }),
            EmployeeTopic::Manager => lookup.get_manager(emp_id).map(|manager| {
                format!(
                    "Manager Information:\n- Manager Name: {}\n- Email: {}\n- Phone: {}\n- Role: {}",
                    manager.manager_name, manager.email, manager.phone, manager.role
                )
            }),
            EmployeeTopic::Department => lookup.get_department(emp_id).map(|dept| {
                format!(
                    "Department Information:\n- Department: {}\n- Role: {}\n- Manager: {}\n- Team Size: {} members\n- Joining Date: {}",
                    dept.department, dept.role, dept.manager, dept.team_size, dept.joining_date
                )
            }),
        };
        blocks.extend(block);
    }

    if blocks.is_empty() {
        blocks.push(format!(
            "Employee Information:\n- Name: {}\n- Employee ID: {}\n- Department: {}\n- Role: {}\n- Manager: {}",
            record.name, record.emp_id, record.department, record.role, record.manager
        ));
    }

    blocks.join("\n\n")
}
