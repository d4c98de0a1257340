//! Integration tests for queue execution, cycles, prompting, run-levels,
//! and persistence

mod common;

use cadre::error::{CadreError, ExecutionError};
use cadre::params::ScriptedPrompter;
use cadre::{App, Command, Cycle, ParamDef, ParamValue, Recovery, RunLevel, ValueKind, Verbosity};
use common::{entries, event_log, logging_command, logging_hook, silent_app};
use std::rc::Rc;

#[test]
fn test_chain_executes_after_command() {
    let log = event_log();
    let mut app = silent_app("chain");
    app.command(logging_command("start", &log).next_commands(["authenticate"]))
        .unwrap();
    app.command(logging_command("authenticate", &log)).unwrap();

    let outcome = app.execute(&["start"]).unwrap();

    assert_eq!(entries(&log), vec!["start", "authenticate"]);
    assert_eq!(outcome.completed, vec!["start", "authenticate"]);
}

#[test]
fn test_chain_dedups_against_completed_set() {
    let log = event_log();
    let mut app = silent_app("chain-dedup");
    app.command(logging_command("fetch", &log)).unwrap();
    app.command(logging_command("report", &log).next_commands(["fetch"]))
        .unwrap();

    let outcome = app.execute(&["fetch", "report"]).unwrap();

    // fetch is already completed when report's chain fires
    assert_eq!(outcome.completed, vec!["fetch", "report"]);
}

#[test]
fn test_chained_command_pulls_its_prerequisites() {
    let log = event_log();
    let mut app = silent_app("chain-prereq");
    app.command(logging_command("setup", &log)).unwrap();
    app.command(logging_command("publish", &log).require_before(["setup"]))
        .unwrap();
    app.command(logging_command("build", &log).next_commands(["publish"]))
        .unwrap();

    let outcome = app.execute(&["build"]).unwrap();
    assert_eq!(outcome.completed, vec!["build", "setup", "publish"]);
}

#[test]
fn test_trigger_param_set_during_execution() {
    let log = event_log();
    let mut app = silent_app("trigger");
    app.param(ParamDef::new("upload", ValueKind::Bool));
    app.command(Command::new("configure").run(|ctx| {
        ctx.params.set("upload", true);
        Ok(())
    }))
    .unwrap();
    app.command(logging_command("upload-files", &log).trigger_param("upload"))
        .unwrap();

    let outcome = app.execute(&["configure"]).unwrap();
    assert_eq!(outcome.completed, vec!["configure", "upload-files"]);
}

#[test]
fn test_cycle_runs_three_iterations() {
    let log = event_log();
    let mut app = silent_app("cycle");
    app.param(ParamDef::new("max-iterations", ValueKind::Int).default_value(ParamValue::Int(3)));

    let init_log = Rc::clone(&log);
    let end_log = Rc::clone(&log);
    let cond_log = Rc::clone(&log);

    let cycle = Cycle::new("count-loop")
        .init(move |ctx| {
            init_log.borrow_mut().push("init".to_string());
            ctx.params.set("counter", 0i64);
            Ok(())
        })
        .condition(move |ctx| {
            cond_log.borrow_mut().push("check".to_string());
            Ok(ctx.params.get_int("counter")? < ctx.params.get_int("max-iterations")?)
        })
        .member_inline(Command::new("bump").run(|ctx| {
            let counter = ctx.params.get_int("counter")?;
            ctx.params.set("counter", counter + 1);
            Ok(())
        }))
        .end(move |_| {
            end_log.borrow_mut().push("end".to_string());
            Ok(())
        });

    app.command(Command::new("count").cycle(cycle)).unwrap();

    let outcome = app.execute(&["count"]).unwrap();

    // init runs before the first condition check; the counter holds 3
    // after the end hook
    assert_eq!(
        entries(&log),
        vec!["init", "check", "check", "check", "check", "end"]
    );
    assert_eq!(outcome.params.get_int("counter").unwrap(), 3);
}

#[test]
fn test_cycle_zero_iterations_still_runs_init_and_end() {
    let log = event_log();
    let mut app = silent_app("cycle-zero");

    let cycle = Cycle::new("never-loop")
        .init(logging_hook("init", &log))
        .condition(|_| Ok(false))
        .member_inline(logging_command("member", &log))
        .end(logging_hook("end", &log));

    app.command(Command::new("never").cycle(cycle)).unwrap();
    app.execute(&["never"]).unwrap();

    assert_eq!(entries(&log), vec!["init", "end"]);
}

#[test]
fn test_cycle_member_failure_still_runs_end_hook() {
    let log = event_log();
    let mut app = silent_app("cycle-abort");

    let cycle = Cycle::new("doomed-loop")
        .condition(|_| Ok(true))
        .member_inline(Command::new("explode").run(|_| {
            Err(ExecutionError::ActionFailed {
                command: "explode".to_string(),
                message: "boom".to_string(),
            })
        }))
        .end(logging_hook("end", &log));

    app.command(Command::new("doomed").cycle(cycle)).unwrap();

    let result = app.execute(&["doomed"]);
    assert!(matches!(
        result,
        Err(CadreError::Execution(ExecutionError::ActionFailed { .. }))
    ));
    assert_eq!(entries(&log), vec!["end"]);
}

#[test]
fn test_cycle_hooks_added_to_registered_command() {
    let log = event_log();
    let mut app = silent_app("add-cycle");
    app.param(ParamDef::new("rounds", ValueKind::Int).default_value(ParamValue::Int(2)));
    app.command(logging_command("ping", &log)).unwrap();
    app.command(Command::new("watch")).unwrap();

    let cycle = Cycle::new("watch-loop")
        .init(|ctx| {
            ctx.params.set("done", 0i64);
            Ok(())
        })
        .condition(|ctx| Ok(ctx.params.get_int("done")? < ctx.params.get_int("rounds")?))
        .loop_end(|ctx| {
            let done = ctx.params.get_int("done")?;
            ctx.params.set("done", done + 1);
            Ok(())
        })
        .member("ping");

    app.add_cycle("watch", cycle).unwrap();

    let outcome = app.execute(&["watch"]).unwrap();
    assert_eq!(entries(&log), vec!["ping", "ping"]);
    assert_eq!(outcome.params.get_int("done").unwrap(), 2);
}

#[test]
fn test_required_param_prompted_once() {
    let log = event_log();
    let mut app = silent_app("prompt-once")
        .with_prompter(Box::new(ScriptedPrompter::new(["hello"])));
    app.param(ParamDef::new("greeting", ValueKind::Str).prompt("Greeting"));
    app.command(logging_command("first", &log).required_params(["greeting"]))
        .unwrap();
    app.command(logging_command("second", &log).required_params(["greeting"]))
        .unwrap();

    // a single scripted response suffices: the second command reuses the
    // resolved value instead of prompting again
    let outcome = app.execute(&["first", "second"]).unwrap();
    assert_eq!(outcome.completed, vec!["first", "second"]);
    assert_eq!(outcome.params.get_str("greeting").unwrap(), "hello");
}

#[test]
fn test_prompt_retries_exhausted_surfaces() {
    let mut app = silent_app("prompt-retries")
        .with_prompter(Box::new(ScriptedPrompter::new(["x", "y", "z"])));
    app.param(ParamDef::new("count", ValueKind::Int).prompt("Count"));
    app.command(Command::new("run").required_params(["count"]))
        .unwrap();

    let result = app.execute(&["run"]);
    assert!(matches!(
        result,
        Err(CadreError::Execution(ExecutionError::RetriesExhausted {
            ..
        }))
    ));
}

#[test]
fn test_missing_required_param_without_prompt_fails() {
    let mut app = silent_app("missing-param");
    app.param(ParamDef::new("target", ValueKind::Str));
    app.command(Command::new("deploy").required_params(["target"]))
        .unwrap();

    let result = app.execute(&["deploy"]);
    assert!(matches!(
        result,
        Err(CadreError::Execution(
            ExecutionError::MissingRequiredParam { .. }
        ))
    ));
}

#[test]
fn test_run_level_handler_recovers_and_queue_continues() {
    let log = event_log();
    let mut app = silent_app("handler");
    app.param(ParamDef::new("target", ValueKind::Str));
    app.command(Command::new("deploy").required_params(["target"]))
        .unwrap();
    app.command(logging_command("report", &log)).unwrap();
    app.run_level(
        RunLevel::new("main")
            .commands(["deploy", "report"])
            .on_error(|err| {
                if cadre::error::is_param_failure(err) {
                    Recovery::Recovered
                } else {
                    Recovery::Reraise
                }
            }),
    );

    let outcome = app.execute(&["deploy", "report"]).unwrap();

    // deploy is treated as completed, report still runs
    assert_eq!(outcome.completed, vec!["deploy", "report"]);
    assert_eq!(entries(&log), vec!["report"]);
}

#[test]
fn test_run_levels_execute_in_declaration_order() {
    let log = event_log();
    let mut app = silent_app("levels");
    app.command(logging_command("load-config", &log)).unwrap();
    app.command(logging_command("deploy", &log)).unwrap();
    app.command(logging_command("sweep", &log)).unwrap();
    app.run_level(RunLevel::new("config").command("load-config"));
    app.run_level(RunLevel::new("exec").command("deploy").default_level());
    app.run_level(RunLevel::new("cleanup").command("sweep"));

    // request order does not override run-level order
    let outcome = app.execute(&["sweep", "deploy", "load-config"]).unwrap();
    assert_eq!(outcome.completed, vec!["load-config", "deploy", "sweep"]);
}

#[test]
fn test_run_level_overlay_and_param_scoping() {
    let log = event_log();
    let seen = Rc::clone(&log);
    let mut app = silent_app("overlay");
    app.param(ParamDef::new("profile", ValueKind::Str));

    app.command(Command::new("inspect").run(move |ctx| {
        let state = if ctx.params.is_set("profile") {
            format!("profile={}", ctx.params.get_str("profile")?)
        } else {
            "profile unset".to_string()
        };
        seen.borrow_mut().push(state);
        Ok(())
    }))
    .unwrap();
    app.command(logging_command("noop", &log)).unwrap();

    // profile is scoped to the exec level: the init level must not see it
    app.run_level(RunLevel::new("init").command("inspect"));
    app.run_level(
        RunLevel::new("exec")
            .param("profile")
            .command("noop")
            .overlay("profile", "release")
            .default_level(),
    );

    app.execute(&["inspect", "noop"]).unwrap();
    assert_eq!(entries(&log), vec!["profile unset", "noop"]);
}

#[test]
fn test_persisted_param_round_trip() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let store_path = temp_dir.path().join("params.json");

    let mut app = silent_app("persist").with_store_path(store_path.clone());
    app.param(ParamDef::new("token", ValueKind::Str).persist());
    app.command(Command::new("login").run(|ctx| {
        ctx.params.set("token", "abc123");
        Ok(())
    }))
    .unwrap();
    app.execute(&["login"]).unwrap();

    assert!(store_path.exists());

    // a fresh app resolves the parameter from the store, so the command
    // requiring it runs without prompting
    let mut next = silent_app("persist").with_store_path(store_path);
    next.param(ParamDef::new("token", ValueKind::Str).persist());
    next.command(Command::new("publish").required_params(["token"]))
        .unwrap();

    let outcome = next.execute(&["publish"]).unwrap();
    assert_eq!(outcome.params.get_str("token").unwrap(), "abc123");
}

#[test]
fn test_run_from_parses_params_and_queue() {
    let log = event_log();
    let mut app = silent_app("cli-run");
    app.param(ParamDef::new("target", ValueKind::Str));
    app.param(ParamDef::new("announce", ValueKind::Bool));
    app.command(logging_command("build", &log).required_params(["target"]))
        .unwrap();
    app.command(logging_command("announce-release", &log).trigger_param("announce"))
        .unwrap();

    let outcome = app
        .run_from(["cli-run", "--silent", "build", "--target", "release", "--announce"])
        .unwrap();

    assert_eq!(outcome.completed, vec!["build", "announce-release"]);
    assert_eq!(outcome.params.get_str("target").unwrap(), "release");
}

#[test]
fn test_run_from_rejects_unknown_flag() {
    let mut app = silent_app("cli-err");
    app.command(Command::new("build")).unwrap();

    let result = app.run_from(["cli-err", "--no-such-flag"]);
    assert!(matches!(result, Err(CadreError::Cli(_))));
}

#[test]
fn test_recursive_cycle_membership_is_an_error() {
    let mut app = silent_app("recursive");
    let cycle = Cycle::new("self-loop")
        .condition(|_| Ok(true))
        .member("watch");
    app.command(Command::new("watch").cycle(cycle)).unwrap();

    let result = app.execute(&["watch"]);
    assert!(matches!(
        result,
        Err(CadreError::Execution(ExecutionError::RecursiveCommand(_)))
    ));
}

#[test]
fn test_env_fallback_resolves_param() {
    std::env::set_var("CADRE_TEST_REGION", "eu-west-1");

    let mut app = silent_app("env");
    app.param(ParamDef::new("region", ValueKind::Str).env("CADRE_TEST_REGION"));
    app.command(Command::new("where").required_params(["region"]))
        .unwrap();

    let outcome = app.execute(&["where"]).unwrap();
    assert_eq!(outcome.params.get_str("region").unwrap(), "eu-west-1");

    std::env::remove_var("CADRE_TEST_REGION");
}

#[test]
fn test_set_param_and_reset_between_runs() {
    let mut app = silent_app("preset");
    app.param(ParamDef::new("target", ValueKind::Str));
    app.command(Command::new("deploy").required_params(["target"]))
        .unwrap();

    app.set_param("target", "prod");
    let outcome = app.execute(&["deploy"]).unwrap();
    assert_eq!(outcome.params.get_str("target").unwrap(), "prod");

    // reset clears resolved values, so the next run is independent
    app.reset();
    let result = app.execute(&["deploy"]);
    assert!(matches!(
        result,
        Err(CadreError::Execution(
            ExecutionError::MissingRequiredParam { .. }
        ))
    ));
}

#[test]
fn test_verbosity_flag_maps_from_cli() {
    // smoke test: --quiet parses and the run still executes
    let log = event_log();
    let mut app = App::new("verbosity").with_verbosity(Verbosity::Silent);
    app.command(logging_command("noop", &log)).unwrap();

    app.run_from(["verbosity", "--quiet", "noop"]).unwrap();
    assert_eq!(entries(&log), vec!["noop"]);
}
