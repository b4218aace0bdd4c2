use crate::info::Schema;
use crate::registry::SchemaRegistry;

fn register_one<T: Schema>(registry: &mut SchemaRegistry) {
    registry.register::<T>();
}

/// A link-time registration submitted by `#[schema(auto_register)]`.
pub struct AutoRegistration {
    register: fn(&mut SchemaRegistry),
}

impl AutoRegistration {
    pub const fn of<T: Schema>() -> Self {
        Self {
            register: register_one::<T>,
        }
    }
}

inventory::collect!(AutoRegistration);

pub(crate) fn register_all(registry: &mut SchemaRegistry) -> usize {
    let mut count = 0;
    for entry in inventory::iter::<AutoRegistration> {
        (entry.register)(registry);
        count += 1;
    }
    count
}
