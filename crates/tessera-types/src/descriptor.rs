use std::fmt;

/// Static shape identifier for a message type.
///
/// Descriptors are declared once per message type as a `static` and handed
/// to serializers so that decode failures can name the shape they were
/// trying to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageDescriptor {
    /// Program (IDL file) namespace the message was declared in.
    pub namespace: &'static str,
    /// Simple type name of the message.
    pub name: &'static str,
}

impl MessageDescriptor {
    /// Create a new descriptor.
    pub const fn new(namespace: &'static str, name: &'static str) -> Self {
        Self { namespace, name }
    }

    /// `namespace.name`, or just `name` when the namespace is empty.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

impl fmt::Display for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}
