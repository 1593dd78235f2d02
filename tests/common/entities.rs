use uuid::Uuid;

/// Account row used by the PostgreSQL tests
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub owner: String,
    pub balance: i64,
}

impl Account {
    pub fn new(owner: &str, balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.to_string(),
            balance,
        }
    }
}
