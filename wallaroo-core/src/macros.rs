/// Define a resource type backed by [`ResourceProxy`](crate::ResourceProxy).
///
/// Writable attributes get a getter and a `set_<name>` setter; read-only
/// attributes get only a getter. The schema is built once on first use and
/// shared by every instance.
///
/// ```
/// use wallaroo_core::Resource;
///
/// wallaroo_core::resource! {
///     /// A broker queue.
///     pub struct Queue: "queue" {
///         attributes: [name, durable],
///         read_only: [depth],
///     }
/// }
///
/// assert!(Queue::schema().is_read_only("depth"));
/// assert!(!Queue::schema().is_read_only("durable"));
/// ```
///
/// Read-only attributes have no setter:
///
/// ```compile_fail
/// wallaroo_core::resource! {
///     pub struct Queue: "queue" {
///         attributes: [name],
///         read_only: [depth],
///     }
/// }
///
/// fn bump(queue: &mut Queue) {
///     queue.set_depth(3);
/// }
/// ```
///
/// Each attribute name may appear once across both lists. A repeated name
/// is rejected at compile time, unlike
/// [`AttributeSchema::declare`](crate::AttributeSchema::declare), which
/// overwrites in place:
///
/// ```compile_fail
/// wallaroo_core::resource! {
///     pub struct Role: "role" {
///         attributes: [name, level],
///         read_only: [level],
///     }
/// }
/// ```
///
/// ```compile_fail
/// wallaroo_core::resource! {
///     pub struct Role: "role" {
///         attributes: [name, name],
///     }
/// }
/// ```
#[macro_export]
macro_rules! resource {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $kind:literal {
            attributes: [ $( $attr:ident ),* $(,)? ]
            $(, read_only: [ $( $ro:ident ),* $(,)? ] )?
            $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            proxy: $crate::ResourceProxy,
        }

        impl $crate::Resource for $name {
            fn schema() -> &'static $crate::AttributeSchema {
                static SCHEMA: ::std::sync::OnceLock<$crate::AttributeSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::AttributeSchema::new($kind)
                        $( .attribute(stringify!($attr)) )*
                        $( $( .read_only(stringify!($ro)) )* )?
                })
            }

            fn from_proxy(proxy: $crate::ResourceProxy) -> Self {
                Self { proxy }
            }

            fn proxy(&self) -> &$crate::ResourceProxy {
                &self.proxy
            }

            fn proxy_mut(&mut self) -> &mut $crate::ResourceProxy {
                &mut self.proxy
            }

            fn into_proxy(self) -> $crate::ResourceProxy {
                self.proxy
            }
        }

        impl $name {
            $(
                pub fn $attr(&self) -> Option<&$crate::__private::serde_json::Value> {
                    self.proxy.get(stringify!($attr))
                }

                $crate::__private::paste! {
                    pub fn [<set_ $attr>](
                        &mut self,
                        value: impl Into<$crate::__private::serde_json::Value>,
                    ) -> &mut Self {
                        self.proxy.store_declared(stringify!($attr), value.into());
                        self
                    }
                }
            )*

            $( $(
                pub fn $ro(&self) -> Option<&$crate::__private::serde_json::Value> {
                    self.proxy.get(stringify!($ro))
                }
            )* )?
        }
    };
}
