//! Demo application: a small release helper built on the framework
//!
//! Shows the pieces an application author wires together: phases, ordered
//! commands with prerequisites and chains, prompted and persisted
//! parameters, a trigger parameter, and a repeat-loop cycle.
//!
//! Try:
//!   cadre-demo --list-commands
//!   cadre-demo build --project demo
//!   cadre-demo poll --count 3
//!   cadre-demo build tidy --project demo --announce

use anyhow::Result;
use cadre::{App, Command, Cycle, ParamDef, ParamValue, ValueKind};
use clap::crate_version;
use std::path::PathBuf;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let app = build_app()?;
    app.run()?;
    Ok(())
}

fn build_app() -> Result<App> {
    let mut app = App::new("cadre-demo")
        .with_version(crate_version!())
        .with_about("Release helper demonstrating the cadre framework");

    if let Ok(path) = std::env::var("CADRE_DEMO_STORE") {
        app = app.with_store_path(PathBuf::from(path));
    }

    app.declare_phases(&["setup", "execution", "cleanup"], "execution")?;

    app.param(
        ParamDef::new("project", ValueKind::Str)
            .about("Project name")
            .prompt("Project name"),
    );
    app.param(
        ParamDef::new("count", ValueKind::Int)
            .about("Number of poll checks")
            .default_value(ParamValue::Int(1)),
    );
    app.param(
        ParamDef::new("token", ValueKind::Str)
            .about("Publish token")
            .env("CADRE_DEMO_TOKEN")
            .prompt_sensitive("Publish token")
            .persist(),
    );
    app.param(
        ParamDef::new("announce", ValueKind::Bool)
            .about("Announce the release after it is built"),
    );

    app.command(
        Command::new("init")
            .about("Prepare the workspace")
            .phase("setup")
            .run(|_| {
                println!("init: preparing workspace");
                Ok(())
            }),
    )?;

    app.command(
        Command::new("validate")
            .about("Validate the project layout")
            .require_before(["init"])
            .run(|_| {
                println!("validate: project layout ok");
                Ok(())
            }),
    )?;

    app.command(
        Command::new("build")
            .about("Build the project")
            .require_before(["validate"])
            .required_params(["project"])
            .next_commands(["package"])
            .run(|ctx| {
                println!("build: {}", ctx.params.get_str("project")?);
                Ok(())
            }),
    )?;

    app.command(
        Command::new("package")
            .about("Package the build output")
            .run(|_| {
                println!("package: archive written");
                Ok(())
            }),
    )?;

    app.command(
        Command::new("publish")
            .about("Publish the packaged release")
            .require_before(["build"])
            .required_params(["token"])
            .run(|_| {
                println!("publish: release uploaded");
                Ok(())
            }),
    )?;

    app.command(
        Command::new("announce")
            .about("Announce the release")
            .trigger_param("announce")
            .goes_after(["build"])
            .run(|_| {
                println!("announce: release announced");
                Ok(())
            }),
    )?;

    app.command(
        Command::new("tidy")
            .about("Remove intermediate files")
            .phase("cleanup")
            .run(|_| {
                println!("tidy: workspace clean");
                Ok(())
            }),
    )?;

    let poll_cycle = Cycle::new("poll-loop")
        .init(|ctx| {
            ctx.params.set("checks", 0i64);
            Ok(())
        })
        .condition(|ctx| Ok(ctx.params.get_int("checks")? < ctx.params.get_int("count")?))
        .member_inline(Command::new("check").hidden().run(|ctx| {
            let done = ctx.params.get_int("checks")?;
            println!("check #{}", done + 1);
            ctx.params.set("checks", done + 1);
            Ok(())
        }))
        .end(|ctx| {
            println!("poll: {} check(s) completed", ctx.params.get_int("checks")?);
            Ok(())
        });

    app.command(
        Command::new("poll")
            .about("Poll for release status")
            .cycle(poll_cycle),
    )?;

    Ok(app)
}
