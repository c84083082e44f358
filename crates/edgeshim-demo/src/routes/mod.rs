use edgeshim_express::RouteDescriptor;

mod inspect;
mod tools;

/// Every route module, in registration order.
pub fn all() -> Vec<RouteDescriptor> {
    vec![
        tools::ping(),
        tools::echo(),
        tools::reverse(),
        tools::divide(),
        tools::banner(),
        inspect::request(),
        inspect::user(),
        inspect::redirect(),
    ]
}
