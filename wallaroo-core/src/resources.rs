//! Built-in resource kinds

crate::resource! {
    /// A broker user and the role it is granted.
    pub struct User: "user" {
        attributes: [name, role],
    }
}
