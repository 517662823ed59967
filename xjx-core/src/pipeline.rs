//! Pipeline executor
//!
//! A [`Stage`] is a named unit of validate/execute/recover logic. The
//! [`Pipeline`] runs every stage the same way:
//!
//! 1. caller "before" hook (may replace the input)
//! 2. stage `before_transform` (may replace the input)
//! 3. `validate`
//! 4. `execute`, falling back to `on_error` once if it fails
//! 5. stage `after_transform` (may replace the output)
//! 6. caller "after" hook (may replace the output)
//!
//! Hook failures are logged and ignored. Validation and execution failures
//! propagate, wrapped with the stage name.
//!
//! Trees cross the pipeline boundary under an explicit [`ClonePolicy`], so a
//! caller never shares a node with the tree a stage works on.

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Result, XjxError};
use crate::node::{ClonePolicy, Node};

/// A named conversion step
///
/// Only `name` and `execute` are required; every other method has a
/// pass-through default.
pub trait Stage {
    type Input;
    type Output;

    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Reject input before any work is done
    fn validate(&self, input: &Self::Input, config: &Config) -> Result<()> {
        let _ = (input, config);
        Ok(())
    }

    fn execute(&self, input: &Self::Input, config: &Config) -> Result<Self::Output>;

    /// Recover from a failed `execute`. `None` lets the error propagate.
    fn on_error(&self, error: &XjxError, input: &Self::Input) -> Option<Self::Output> {
        let _ = (error, input);
        None
    }

    /// Replace the input before validation
    fn before_transform(&self, input: &Self::Input) -> Result<Option<Self::Input>> {
        let _ = input;
        Ok(None)
    }

    /// Replace the output after execution
    fn after_transform(&self, output: &Self::Output) -> Result<Option<Self::Output>> {
        let _ = output;
        Ok(None)
    }
}

type BeforeHook<'h, I> = Box<dyn FnMut(&I) -> Result<Option<I>> + 'h>;
type AfterHook<'h, O> = Box<dyn FnMut(&O) -> Result<Option<O>> + 'h>;

/// Caller-supplied hooks around one stage execution
///
/// ```ignore
/// let hooks = Hooks::new().after(|value: &Value| {
///     println!("{}", value);
///     Ok(None)
/// });
/// ```
pub struct Hooks<'h, I, O> {
    before: Option<BeforeHook<'h, I>>,
    after: Option<AfterHook<'h, O>>,
}

impl<'h, I, O> Hooks<'h, I, O> {
    pub fn new() -> Self {
        Hooks { before: None, after: None }
    }

    /// Run `f` on the stage input; `Ok(Some(x))` replaces it with `x`
    pub fn before(mut self, f: impl FnMut(&I) -> Result<Option<I>> + 'h) -> Self {
        self.before = Some(Box::new(f));
        self
    }

    /// Run `f` on the stage output; `Ok(Some(x))` replaces it with `x`
    pub fn after(mut self, f: impl FnMut(&O) -> Result<Option<O>> + 'h) -> Self {
        self.after = Some(Box::new(f));
        self
    }
}

impl<I, O> Default for Hooks<'_, I, O> {
    fn default() -> Self {
        Hooks::new()
    }
}

/// Runs stages against one configuration
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Raw external input to a tree
    pub fn execute_source<S>(&self, stage: &S, input: S::Input, hooks: Hooks<'_, S::Input, Node>) -> Result<Node>
    where
        S: Stage<Output = Node>,
    {
        self.run(stage, input, hooks)
    }

    /// Tree to external output. The stage works on a branch copy of `node`.
    pub fn execute_output<S>(&self, stage: &S, node: &Node, hooks: Hooks<'_, Node, S::Output>) -> Result<S::Output>
    where
        S: Stage<Input = Node>,
    {
        self.run(stage, ClonePolicy::Branch.apply(node), hooks)
    }

    /// Tree to tree. `node` is copied before the stage sees it and is
    /// never modified.
    pub fn execute_transform<S>(&self, stage: &S, node: &Node, hooks: Hooks<'_, Node, Node>) -> Result<Node>
    where
        S: Stage<Input = Node, Output = Node>,
    {
        self.run(stage, ClonePolicy::Transform.apply(node), hooks)
    }

    fn run<S: Stage>(&self, stage: &S, input: S::Input, hooks: Hooks<'_, S::Input, S::Output>) -> Result<S::Output> {
        let name = stage.name();
        let Hooks { before, after } = hooks;

        let mut input = input;
        if let Some(mut hook) = before {
            input = apply_hook(name, "before step", input, |value| hook(value));
        }
        input = apply_hook(name, "before transform", input, |value| stage.before_transform(value));

        stage.validate(&input, &self.config).map_err(|err| err.in_stage(name))?;

        debug!(stage = name, "executing stage");
        let output = match stage.execute(&input, &self.config) {
            Ok(output) => output,
            Err(err) => match stage.on_error(&err, &input) {
                Some(recovered) => {
                    debug!(stage = name, error = %err, "stage recovered from error");
                    recovered
                }
                None => return Err(err.in_stage(name)),
            },
        };

        let mut output = apply_hook(name, "after transform", output, |value| stage.after_transform(value));
        if let Some(mut hook) = after {
            output = apply_hook(name, "after step", output, |value| hook(value));
        }

        debug!(stage = name, "stage finished");
        Ok(output)
    }
}

/// Run one hook. A replacement wins, a failure keeps `value`.
fn apply_hook<T>(stage: &str, position: &str, value: T, hook: impl FnOnce(&T) -> Result<Option<T>>) -> T {
    match hook(&value) {
        Ok(Some(replacement)) => replacement,
        Ok(None) => value,
        Err(err) => {
            warn!(stage, hook = position, error = %err, "hook failed, continuing without it");
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Uppercases text; fails on "fail", recovers from "recover"
    struct Shout<'l> {
        log: &'l RefCell<Vec<String>>,
        broken_hooks: bool,
    }

    impl Stage for Shout<'_> {
        type Input = String;
        type Output = String;

        fn name(&self) -> &str {
            "shout"
        }

        fn validate(&self, input: &String, _config: &Config) -> Result<()> {
            self.log.borrow_mut().push(format!("validate {}", input));
            if input.is_empty() {
                return Err(XjxError::validation("empty input"));
            }
            Ok(())
        }

        fn execute(&self, input: &String, _config: &Config) -> Result<String> {
            self.log.borrow_mut().push(format!("execute {}", input));
            if input.starts_with("fail") || input.starts_with("recover") {
                return Err(XjxError::processing("cannot shout"));
            }
            Ok(input.to_uppercase())
        }

        fn on_error(&self, _error: &XjxError, input: &String) -> Option<String> {
            input.starts_with("recover").then(|| "recovered".to_string())
        }

        fn before_transform(&self, input: &String) -> Result<Option<String>> {
            if self.broken_hooks {
                return Err(XjxError::processing("broken before"));
            }
            Ok(Some(format!("{}!", input)))
        }

        fn after_transform(&self, output: &String) -> Result<Option<String>> {
            if self.broken_hooks {
                return Err(XjxError::processing("broken after"));
            }
            self.log.borrow_mut().push(format!("after transform {}", output));
            Ok(None)
        }
    }

    #[test]
    fn test_execution_order() {
        let log = RefCell::new(Vec::new());
        let stage = Shout { log: &log, broken_hooks: false };
        let hooks = Hooks::new()
            .before(|input: &String| {
                log.borrow_mut().push(format!("before step {}", input));
                Ok(Some(format!("{} there", input)))
            })
            .after(|output: &String| {
                log.borrow_mut().push(format!("after step {}", output));
                Ok(None)
            });

        let output = Pipeline::default().run(&stage, "hi".to_string(), hooks).unwrap();
        assert_eq!(output, "HI THERE!");
        assert_eq!(
            *log.borrow(),
            vec![
                "before step hi",
                "validate hi there!",
                "execute hi there!",
                "after transform HI THERE!",
                "after step HI THERE!",
            ]
        );
    }

    #[test]
    fn test_hook_failures_are_ignored() {
        let log = RefCell::new(Vec::new());
        let stage = Shout { log: &log, broken_hooks: true };
        let hooks = Hooks::new().after(|_: &String| Err(XjxError::processing("broken caller hook")));
        let output = Pipeline::default().run(&stage, "ok".to_string(), hooks).unwrap();
        assert_eq!(output, "OK");
    }

    #[test]
    fn test_validation_failure_names_the_stage() {
        let log = RefCell::new(Vec::new());
        let stage = Shout { log: &log, broken_hooks: true };
        let err = Pipeline::default().run(&stage, String::new(), Hooks::new()).unwrap_err();
        assert_eq!(err.stage(), Some("shout"));
        assert!(matches!(err.root(), XjxError::Validation { .. }));
        assert!(!log.borrow().iter().any(|entry| entry.starts_with("execute")));
    }

    #[test]
    fn test_on_error_recovers_or_propagates() {
        let log = RefCell::new(Vec::new());
        let stage = Shout { log: &log, broken_hooks: true };
        let pipeline = Pipeline::default();

        let recovered = pipeline.run(&stage, "recover".to_string(), Hooks::new()).unwrap();
        assert_eq!(recovered, "recovered");

        let err = pipeline.run(&stage, "fail".to_string(), Hooks::new()).unwrap_err();
        assert_eq!(err.stage(), Some("shout"));
        assert_eq!(err.root(), &XjxError::processing("cannot shout"));
    }

    struct Rename;

    impl Stage for Rename {
        type Input = Node;
        type Output = Node;

        fn name(&self) -> &str {
            "rename"
        }

        fn execute(&self, input: &Node, _config: &Config) -> Result<Node> {
            let mut output = input.clone();
            if let Some(record) = output.as_record_mut() {
                record.name = "renamed".to_string();
            }
            Ok(output)
        }
    }

    #[test]
    fn test_transform_leaves_input_untouched() {
        let original: Node = Node::record("original").with_child(Node::record("child")).into();
        let output = Pipeline::default()
            .execute_transform(&Rename, &original, Hooks::new())
            .unwrap();
        assert_eq!(output.name(), "renamed");
        assert_eq!(original.name(), "original");
        assert_eq!(output.children(), original.children());
    }
}
