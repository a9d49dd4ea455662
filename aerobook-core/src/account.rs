use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub bookings: Vec<Uuid>,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            bookings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    Write,
    Delete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Write => "WRITE",
            Permission::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WRITE" => Ok(Permission::Write),
            "DELETE" => Ok(Permission::Delete),
            other => Err(format!("unknown permission: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub permissions: Vec<Permission>,
    pub managed_flights: Vec<Uuid>,
}

impl Admin {
    pub fn new(email: &str, permissions: Vec<Permission>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            permissions,
            managed_flights: Vec::new(),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_wire_format() {
        let admin = Admin::new("ops@example.com", vec![Permission::Write]);
        let json = serde_json::to_value(&admin).unwrap();
        assert_eq!(json["permissions"][0], "WRITE");
        assert_eq!(json["managedFlights"].as_array().unwrap().len(), 0);

        assert!(admin.has_permission(Permission::Write));
        assert!(!admin.has_permission(Permission::Delete));
        assert_eq!("DELETE".parse::<Permission>().unwrap(), Permission::Delete);
        assert!("READ".parse::<Permission>().is_err());
    }
}
