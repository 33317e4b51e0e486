//! Authorization request type.

use super::entity_uid::EntityUID;
use super::value::Record;

/// The principal/action/resource/context tuple of one authorization
/// request. Context is an arbitrary record; the three subjects are entity
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub principal: EntityUID,
    pub action: EntityUID,
    pub resource: EntityUID,
    pub context: Record,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_request_construction() {
        let mut context = Record::new();
        context.insert("mfa".into(), Value::Bool(true));
        let request = Request {
            principal: EntityUID::new("User", "alice"),
            action: EntityUID::new("Action", "view"),
            resource: EntityUID::new("Document", "doc1"),
            context,
        };
        assert_eq!(request.principal.to_string(), "User::\"alice\"");
        assert_eq!(request.context.get("mfa"), Some(&Value::Bool(true)));
    }
}
