// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Arguments shared by every lifecycle command
fn recipe_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("recipe")
            .default_value(".")
            .help("Recipe file, or a folder containing recipe.toml"),
    )
    .arg(
        Arg::new("settings")
            .short('s')
            .long("settings")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Setting, e.g. -s os=Linux -s compiler.cppstd=20"),
    )
    .arg(
        Arg::new("options")
            .short('o')
            .long("options")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Option, e.g. -o shared=True"),
    )
    .arg(
        Arg::new("profile")
            .long("profile")
            .value_name("FILE")
            .help("Profile file with [settings], [options] and [conf] sections"),
    )
    .arg(
        Arg::new("package_folder")
            .long("package-folder")
            .value_name("DIR")
            .help("Package folder (default: <root>/package)"),
    )
    .arg(
        Arg::new("can_run")
            .long("can-run")
            .value_name("BOOL")
            .help("Whether target binaries can run here (default: detect cross-building)"),
    )
    .arg(
        Arg::new("require_license")
            .long("require-license")
            .action(ArgAction::SetTrue)
            .help("Fail packaging when the license file is missing"),
    )
    .arg(
        Arg::new("jobs")
            .short('j')
            .long("jobs")
            .help("Number of parallel build jobs"),
    )
    .arg(Arg::new("generator").short('G').long("generator").help("CMake generator"))
    .arg(
        Arg::new("cmake")
            .long("cmake")
            .value_name("PATH")
            .help("Path to the cmake executable"),
    )
}

fn allow_unpushed_arg() -> Arg {
    Arg::new("allow_unpushed")
        .long("allow-unpushed")
        .action(ArgAction::SetTrue)
        .help("Accept commits not yet pushed to a remote")
}

fn skip_tests_arg() -> Arg {
    Arg::new("skip_tests")
        .long("skip-tests")
        .action(ArgAction::SetTrue)
        .help("Do not run the test step")
}

fn build_cli() -> Command {
    Command::new("ladle")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ladle Contributors")
        .about("Evaluate package recipes: export, source, build and package")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (overridden by RUST_LOG)"),
        )
        .subcommand(recipe_args(
            Command::new("inspect").about("Show pruned options, build profile and requirements"),
        ))
        .subcommand(
            recipe_args(Command::new("export").about("Record the recipe checkout's url and commit"))
                .arg(allow_unpushed_arg()),
        )
        .subcommand(recipe_args(
            Command::new("source").about("Check out the exported sources"),
        ))
        .subcommand(
            recipe_args(Command::new("build").about("Configure, build and test"))
                .arg(skip_tests_arg()),
        )
        .subcommand(recipe_args(
            Command::new("package").about("Install into the package folder and copy the license"),
        ))
        .subcommand(
            recipe_args(
                Command::new("create")
                    .about("Run the whole lifecycle, resuming where a previous run stopped"),
            )
            .arg(
                Arg::new("no_export")
                    .long("no-export")
                    .action(ArgAction::SetTrue)
                    .help("Reuse the recorded coordinate instead of exporting"),
            )
            .arg(allow_unpushed_arg())
            .arg(skip_tests_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("ladle.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
