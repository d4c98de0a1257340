//! Common test utilities

use cadre::{App, Command, Verbosity};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared event log for observing execution order from actions and hooks
pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

/// A command whose action records its own name in the log
pub fn logging_command(name: &str, log: &EventLog) -> Command {
    let log = Rc::clone(log);
    let tag = name.to_string();
    Command::new(name).run(move |_| {
        log.borrow_mut().push(tag.clone());
        Ok(())
    })
}

/// A hook that records a fixed entry in the log
pub fn logging_hook(
    entry: &str,
    log: &EventLog,
) -> impl Fn(&mut cadre::RunContext) -> cadre::error::ExecutionResult<()> + 'static {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    move |_| {
        log.borrow_mut().push(entry.clone());
        Ok(())
    }
}

pub fn silent_app(name: &str) -> App {
    App::new(name).with_verbosity(Verbosity::Silent)
}
