//! Macros for declaring composites with named children.
//!
//! - `composite!`: declare a composite whose children are typed struct fields

/// Declare a composite step with named, typed children.
///
/// Children execute in declaration order. Because each child is a public
/// field, callers can reach a specific step through
/// [`Composite::steps_mut`](crate::Composite::steps_mut), for instance to
/// hand it the input it halted on.
///
/// # Generated Code
///
/// The macro generates:
/// - `{Name}Steps` struct with one public field per child, implementing
///   [`StepList`](crate::StepList)
/// - `{Name}`, a type alias for `Composite<{Name}Steps>`
///
/// # Example
///
/// ```
/// use rewind::{composite, Context, Step, StepOutcome};
///
/// struct Greet(Option<String>);
///
/// impl Step for Greet {
///     fn execute(&mut self, _ctx: &mut Context) -> StepOutcome {
///         self.0.is_some().into()
///     }
///
///     fn undo(&mut self) {}
/// }
///
/// composite! {
///     /// Says hello once a name is known.
///     pub Hello {
///         greet: Greet,
///     }
/// }
///
/// let mut hello = Hello::new(HelloSteps { greet: Greet(None) });
/// assert!(hello.execute(&mut Context::new()).is_halt());
///
/// hello.steps_mut().greet.0 = Some("world".into());
/// assert!(hello.execute(&mut Context::new()).is_continue());
/// assert_eq!(hello.state(), [1]);
/// ```
#[macro_export]
macro_rules! composite {
    // Count the children
    (@count) => { 0usize };

    (@count $head:ident $($tail:ident)*) => {
        1usize + $crate::composite!(@count $($tail)*)
    };

    (
        $(#[$meta:meta])*
        $vis:vis $name:ident {
            $(
                $(#[$field_meta:meta])*
                $step_name:ident : $step_type:ty
            ),+
            $(,)?
        }
    ) => {
        $crate::paste::paste! {
            #[doc = "Children of [`" $name "`], in execution order."]
            $vis struct [<$name Steps>] {
                $(
                    $(#[$field_meta])*
                    pub $step_name: $step_type,
                )+
            }

            impl $crate::StepList for [<$name Steps>] {
                fn len(&self) -> usize {
                    $crate::composite!(@count $($step_name)+)
                }

                #[allow(unused_assignments)]
                fn step(&self, index: usize) -> ::core::option::Option<&dyn $crate::Step> {
                    let mut position = 0usize;
                    $(
                        if index == position {
                            return ::core::option::Option::Some(&self.$step_name as &dyn $crate::Step);
                        }
                        position += 1;
                    )+
                    ::core::option::Option::None
                }

                #[allow(unused_assignments)]
                fn step_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn $crate::Step> {
                    let mut position = 0usize;
                    $(
                        if index == position {
                            return ::core::option::Option::Some(&mut self.$step_name as &mut dyn $crate::Step);
                        }
                        position += 1;
                    )+
                    ::core::option::Option::None
                }
            }

            $(#[$meta])*
            $vis type $name = $crate::Composite<[<$name Steps>]>;
        }
    };
}
