//! Record bindings for every stored entity
//!
//! Ties each model to its collection name and primary key.

use crate::models::{
    BalanceEdge, Comment, Expense, Group, Notification, Participant, Settlement,
};

use super::Record;

impl Record for Participant {
    const COLLECTION: &'static str = "participants";
    const ENTITY: &'static str = "Participant";

    fn key(&self) -> String {
        self.key.to_string()
    }
}

impl Record for Group {
    const COLLECTION: &'static str = "groups";
    const ENTITY: &'static str = "Group";

    fn key(&self) -> String {
        self.id.key()
    }
}

impl Record for Expense {
    const COLLECTION: &'static str = "expenses";
    const ENTITY: &'static str = "Expense";

    fn key(&self) -> String {
        self.id.key()
    }
}

impl Record for Settlement {
    const COLLECTION: &'static str = "settlements";
    const ENTITY: &'static str = "Settlement";

    fn key(&self) -> String {
        self.id.key()
    }
}

impl Record for BalanceEdge {
    const COLLECTION: &'static str = "balances";
    const ENTITY: &'static str = "BalanceEdge";

    fn key(&self) -> String {
        BalanceEdge::key(self)
    }
}

impl Record for Comment {
    const COLLECTION: &'static str = "comments";
    const ENTITY: &'static str = "Comment";

    fn key(&self) -> String {
        self.id.key()
    }
}

impl Record for Notification {
    const COLLECTION: &'static str = "notifications";
    const ENTITY: &'static str = "Notification";

    fn key(&self) -> String {
        self.id.key()
    }
}
