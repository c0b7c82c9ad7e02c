use std::collections::HashMap;

use dslmngr_schema::PolicyRegistry;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::control::ObjectSpec;
use crate::error::{BusError, Result};
use crate::message::{Invoke, Reply, Table};
use crate::object::Object;
use crate::status::Status;

/// The broker side of object registration.
pub trait ObjectBus {
    /// Publish an object; an error means it was not registered.
    fn add_object(&mut self, spec: &ObjectSpec) -> Result<()>;

    fn remove_object(&mut self, name: &str) -> Result<()>;
}

/// The objects this client serves, registered as a unit.
pub struct ObjectSet {
    objects: Vec<Object>,
    index: HashMap<String, usize>,
    policies: PolicyRegistry,
}

impl ObjectSet {
    /// Register every object, in order, or none of them.
    ///
    /// Argument policies are compiled before anything reaches the bus. If
    /// the bus refuses an object, the ones already added are removed again
    /// in reverse order and the refusal is returned.
    pub fn register(bus: &mut dyn ObjectBus, objects: Vec<Object>) -> Result<Self> {
        let mut index = HashMap::with_capacity(objects.len());
        let mut policies = PolicyRegistry::new();
        for (position, object) in objects.iter().enumerate() {
            if index.insert(object.name().to_string(), position).is_some() {
                return Err(BusError::DuplicateObject(object.name().to_string()));
            }
            for method in object.methods() {
                policies.register(object.object_type(), method.name(), method.policy())?;
            }
        }

        let mut added: Vec<&str> = Vec::with_capacity(objects.len());
        for object in &objects {
            if let Err(err) = bus.add_object(&object.spec()) {
                warn!(object = %object.name(), error = %err, "object registration failed, rolling back");
                for name in added.iter().rev() {
                    if let Err(remove_err) = bus.remove_object(name) {
                        warn!(object = %name, error = %remove_err, "rollback removal failed");
                    }
                }
                return Err(err);
            }
            debug!(object = %object.name(), "object registered");
            added.push(object.name());
        }

        info!(objects = objects.len(), "bus objects registered");
        Ok(Self {
            objects,
            index,
            policies,
        })
    }

    /// Object names in registration order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.objects.iter().map(Object::name)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.index.get(name).map(|&position| &self.objects[position])
    }

    /// Route an invocation to its handler.
    pub fn dispatch(&self, invoke: &Invoke) -> Reply {
        let seq = invoke.seq;
        let Some(object) = self.get(&invoke.object) else {
            debug!(object = %invoke.object, "invoke for unknown object");
            return Reply::error(seq, Status::NotFound);
        };
        let Some(method) = object.find_method(&invoke.method) else {
            debug!(object = %invoke.object, method = %invoke.method, "unknown method");
            return Reply::error(seq, Status::MethodNotFound);
        };

        if let Err(err) = self
            .policies
            .validate(object.object_type(), method.name(), &invoke.args)
        {
            debug!(object = %invoke.object, method = %invoke.method, error = %err, "argument rejected");
            return Reply::error(seq, Status::InvalidArgument);
        }
        let args = match &invoke.args {
            Value::Null => Table::new(),
            Value::Object(args) => args.clone(),
            _ => return Reply::error(seq, Status::InvalidArgument),
        };

        match method.call(&args) {
            Ok(data) => Reply::ok(seq, data),
            Err(status) => {
                debug!(object = %invoke.object, method = %invoke.method, %status, "method failed");
                Reply::error(seq, status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dslmngr_schema::{ArgPolicy, ArgType};
    use serde_json::json;

    use super::*;

    /// Records bus traffic and refuses the `fail_at`-th add (zero based).
    #[derive(Default)]
    struct RecordingBus {
        fail_at: Option<usize>,
        adds: usize,
        log: Vec<String>,
    }

    impl ObjectBus for RecordingBus {
        fn add_object(&mut self, spec: &ObjectSpec) -> Result<()> {
            let attempt = self.adds;
            self.adds += 1;
            if self.fail_at == Some(attempt) {
                return Err(BusError::Rejected {
                    object: spec.name.clone(),
                    status: Status::PermissionDenied,
                });
            }
            self.log.push(format!("add {}", spec.name));
            Ok(())
        }

        fn remove_object(&mut self, name: &str) -> Result<()> {
            self.log.push(format!("remove {name}"));
            Ok(())
        }
    }

    fn sample(name: &str) -> Object {
        Object::new(name, "sample")
            .method("status", ArgPolicy::none(), |_| {
                let mut data = Table::new();
                data.insert("ok".to_string(), json!(true));
                Ok(data)
            })
            .method(
                "stats",
                ArgPolicy::none().arg("interval", ArgType::String),
                |args| match args.get("interval").and_then(Value::as_str) {
                    Some("bogus") => Err(Status::InvalidArgument),
                    _ => Ok(args.clone()),
                },
            )
            .method("broken", ArgPolicy::none(), |_| Err(Status::UnknownError))
    }

    fn invoke(object: &str, method: &str, args: Value) -> Invoke {
        Invoke {
            seq: 1,
            object: object.to_string(),
            method: method.to_string(),
            args,
        }
    }

    #[test]
    fn registers_in_order() {
        let mut bus = RecordingBus::default();
        let set = ObjectSet::register(&mut bus, vec![sample("a"), sample("b"), sample("c")])
            .unwrap();

        assert_eq!(bus.log, ["add a", "add b", "add c"]);
        assert_eq!(set.names().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn failed_registration_rolls_back_in_reverse() {
        let mut bus = RecordingBus {
            fail_at: Some(2),
            ..RecordingBus::default()
        };
        let result = ObjectSet::register(&mut bus, vec![sample("a"), sample("b"), sample("c")]);

        assert!(matches!(
            result,
            Err(BusError::Rejected { object, status: Status::PermissionDenied }) if object == "c"
        ));
        assert_eq!(bus.log, ["add a", "add b", "remove b", "remove a"]);
    }

    #[test]
    fn failure_on_first_object_removes_nothing() {
        let mut bus = RecordingBus {
            fail_at: Some(0),
            ..RecordingBus::default()
        };
        assert!(ObjectSet::register(&mut bus, vec![sample("a"), sample("b")]).is_err());
        assert!(bus.log.is_empty());
    }

    #[test]
    fn duplicate_names_never_reach_the_bus() {
        let mut bus = RecordingBus::default();
        let result = ObjectSet::register(&mut bus, vec![sample("a"), sample("a")]);
        assert!(matches!(result, Err(BusError::DuplicateObject(name)) if name == "a"));
        assert!(bus.log.is_empty());
    }

    #[test]
    fn dispatch_statuses() {
        let mut bus = RecordingBus::default();
        let set = ObjectSet::register(&mut bus, vec![sample("a")]).unwrap();

        let reply = set.dispatch(&invoke("a", "status", Value::Null));
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.data.unwrap()["ok"], true);

        assert_eq!(
            set.dispatch(&invoke("nope", "status", Value::Null)).status,
            Status::NotFound
        );
        assert_eq!(
            set.dispatch(&invoke("a", "nope", Value::Null)).status,
            Status::MethodNotFound
        );
        assert_eq!(
            set.dispatch(&invoke("a", "broken", Value::Null)).status,
            Status::UnknownError
        );
    }

    #[test]
    fn policy_rejects_before_handler() {
        let mut bus = RecordingBus::default();
        let set = ObjectSet::register(&mut bus, vec![sample("a")]).unwrap();

        let wrong_type = set.dispatch(&invoke("a", "stats", json!({"interval": 5})));
        assert_eq!(wrong_type.status, Status::InvalidArgument);

        let not_a_table = set.dispatch(&invoke("a", "stats", json!([1, 2])));
        assert_eq!(not_a_table.status, Status::InvalidArgument);

        let handler_rejects = set.dispatch(&invoke("a", "stats", json!({"interval": "bogus"})));
        assert_eq!(handler_rejects.status, Status::InvalidArgument);

        let accepted = set.dispatch(&invoke("a", "stats", json!({"interval": "total"})));
        assert_eq!(accepted.status, Status::Ok);
        assert_eq!(accepted.data.unwrap()["interval"], "total");
    }
}
