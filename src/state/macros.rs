//! Macros for declaring state tables.

/// Build a [`StateTable`](crate::state::StateTable) for a host type.
///
/// # Example
///
/// ```
/// use demeanor::state::{StateDispatcher, Stateful};
/// use demeanor::state_table;
///
/// struct Counter {
///     count: u32,
///     states: StateDispatcher<Counter>,
/// }
///
/// impl Stateful for Counter {
///     type Args = u32;
///     type Output = u32;
///
///     fn dispatcher(&self) -> &StateDispatcher<Self> {
///         &self.states
///     }
///
///     fn dispatcher_mut(&mut self) -> &mut StateDispatcher<Self> {
///         &mut self.states
///     }
/// }
///
/// let running = state_table! {
///     Counter {
///         "add" => |c, n, _| { c.count += n; c.count },
///         "read" => |c, _, _| c.count,
///     }
/// };
/// assert_eq!(running.len(), 2);
/// ```
#[macro_export]
macro_rules! state_table {
    (
        $host:ty {
            $($method:literal => $body:expr),* $(,)?
        }
    ) => {
        $crate::state::StateTable::<$host>::new()
            $(.method($method, $body))*
    };
}

#[cfg(test)]
mod tests {
    use crate::state::{Reply, StateDispatcher, StateSet, Stateful};

    struct Greeter {
        states: StateDispatcher<Greeter>,
    }

    impl Stateful for Greeter {
        type Args = ();
        type Output = &'static str;

        fn dispatcher(&self) -> &StateDispatcher<Self> {
            &self.states
        }

        fn dispatcher_mut(&mut self) -> &mut StateDispatcher<Self> {
            &mut self.states
        }
    }

    #[test]
    fn state_table_macro_builds_declarable_tables() {
        let set = StateSet::<Greeter>::new("Greeter");
        set.declare([
            ("polite", state_table! { Greeter { "greet" => |_, _, _| "good day" } }),
            ("casual", state_table! { Greeter { "greet" => |_, _, _| "hey", "wave" => |_, _, _| "o/" } }),
        ]);
        let mut greeter = Greeter {
            states: StateDispatcher::new(set.merge().unwrap()),
        };

        greeter.set_state("polite").unwrap();
        assert_eq!(greeter.dispatch("greet", ()).unwrap(), Reply::Value("good day"));
        assert_eq!(greeter.dispatch("wave", ()).unwrap(), Reply::Receiver);

        greeter.set_state("casual").unwrap();
        assert_eq!(greeter.dispatch("wave", ()).unwrap(), Reply::Value("o/"));
    }

    #[test]
    fn state_table_macro_accepts_empty_body() {
        let table = state_table! { Greeter {} };

        assert!(table.is_empty());
    }
}
