use strum_macros::Display;

/// Access level carried in tokens. Only administrators receive tokens today.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Role {
    Admin = 1,
    Employee = 2,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        assert_eq!(Role::from_id(Role::Admin.id()), Some(Role::Admin));
        assert_eq!(Role::from_id(Role::Employee.id()), Some(Role::Employee));
        assert_eq!(Role::from_id(9), None);
    }

    #[test]
    fn displays_variant_name() {
        assert_eq!(Role::Admin.to_string(), "Admin");
        assert_eq!(format!("{}", Role::Employee), "Employee");
    }
}
