use std::fmt;

use dslmngr_schema::ArgPolicy;

use crate::control::{MethodSpec, ObjectSpec};
use crate::message::Table;
use crate::status::Status;

/// Method body: validated arguments in, reply table or status out.
pub type Handler = Box<dyn Fn(&Table) -> Result<Table, Status> + Send>;

/// One callable method of an [`Object`].
pub struct Method {
    name: String,
    policy: ArgPolicy,
    handler: Handler,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> &ArgPolicy {
        &self.policy
    }

    pub fn call(&self, args: &Table) -> Result<Table, Status> {
        (self.handler)(args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A named bus object and its methods.
///
/// Objects of one type share method names and argument policies; the
/// handlers carry whatever per-object state they need.
#[derive(Debug)]
pub struct Object {
    name: String,
    object_type: String,
    methods: Vec<Method>,
}

impl Object {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_type: object_type.into(),
            methods: Vec::new(),
        }
    }

    /// Add a method.
    pub fn method<F>(mut self, name: impl Into<String>, policy: ArgPolicy, handler: F) -> Self
    where
        F: Fn(&Table) -> Result<Table, Status> + Send + 'static,
    {
        self.methods.push(Method {
            name: name.into(),
            policy,
            handler: Box::new(handler),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Description announced to the broker.
    pub fn spec(&self) -> ObjectSpec {
        ObjectSpec {
            name: self.name.clone(),
            object_type: self.object_type.clone(),
            methods: self
                .methods
                .iter()
                .map(|method| MethodSpec {
                    name: method.name.clone(),
                    policy: method.policy.signature(),
                })
                .collect(),
        }
    }
}
