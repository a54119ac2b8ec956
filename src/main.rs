use std::fs::File;
use std::path::PathBuf;

use clap::{arg, command, value_parser, ArgGroup, ArgMatches, Command};
use log::{error, info};

use coursetab::engine::RunConfig;
use coursetab::model::InputModel;
use coursetab::{io, milp, schedule, stats, Error, Term};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    let result = match matches.subcommand() {
        Some(("solve", sub)) => run_solve(sub),
        Some(("show", sub)) => run_show(sub),
        _ => unreachable!("a subcommand is required"),
    };
    std::process::exit(match result {
        Ok(()) => exitcode::OK,
        Err(err) => {
            error!("{}", err);
            exit_code(&err)
        }
    });
}

fn cli() -> Command {
    command!()
        .about("Two-term course timetable optimizer")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Compute the timetable from a roster file and persist it")
                .arg(
                    arg!(-i --input <FILE> "JSON roster file (lecturers, rooms, courses, requests)")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-o --output [FILE] "Where to write the schedule artifact")
                        .default_value("schedule.json")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"time-limit" [SECONDS] "Solver wall clock limit")
                        .default_value("120")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(--gap [FRACTION] "Relative gap at which an incumbent is accepted")
                        .default_value("0.1")
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    arg!(-j --threads [N] "Solver worker threads, 0 for one per core")
                        .default_value("4")
                        .value_parser(value_parser!(u32)),
                )
                .arg(arg!(-q --quiet "Suppress solver progress output")),
        )
        .subcommand(
            Command::new("show")
                .about("Render a persisted schedule")
                .arg(
                    arg!(-a --artifact [FILE] "Schedule artifact to read")
                        .default_value("schedule.json")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(arg!(--student [ID] "Show the timetable of one student"))
                .arg(arg!(--course [CODE] "Show the sections of one course"))
                .arg(arg!(--room [ID] "Show the occupancy of one room"))
                .arg(arg!(--stats "Show the statistics report"))
                .arg(
                    arg!(--term [TERM] "Restrict the view to term 1 or 2")
                        .value_parser(value_parser!(u8).range(1..=2)),
                )
                .group(
                    ArgGroup::new("view")
                        .args(["student", "course", "room", "stats"])
                        .required(true),
                ),
        )
}

fn run_solve(sub: &ArgMatches) -> Result<(), Error> {
    let input = sub.get_one::<PathBuf>("input").unwrap();
    let output = sub.get_one::<PathBuf>("output").unwrap();
    let config = RunConfig {
        time_limit: *sub.get_one::<f64>("time-limit").unwrap(),
        mip_gap: *sub.get_one::<f64>("gap").unwrap(),
        threads: *sub.get_one::<u32>("threads").unwrap(),
        verbose: !sub.get_flag("quiet"),
    };

    let file = File::open(input)?;
    let rosters = io::rosters::read(file)?;
    let model = InputModel::from_rosters(rosters);

    let solution = milp::solve(&model, &config)?;
    let artifact = schedule::extract(&model, &solution)?;
    let statistics = stats::generate(&artifact);

    println!("{}", io::format_report(&statistics));
    io::artifact::store(output, &artifact)?;
    info!("Done, inspect the schedule with 'coursetab show'");
    Ok(())
}

fn run_show(sub: &ArgMatches) -> Result<(), Error> {
    let path = sub.get_one::<PathBuf>("artifact").unwrap();
    let term = sub
        .get_one::<u8>("term")
        .map(|n| if *n == 1 { Term::First } else { Term::Second });
    let artifact = io::artifact::load(path)?;

    if let Some(student) = sub.get_one::<String>("student") {
        println!("{}", io::format_student_schedule(&artifact, student, term)?);
    } else if let Some(course) = sub.get_one::<String>("course") {
        println!("{}", io::format_course_schedule(&artifact, course, term)?);
    } else if let Some(room) = sub.get_one::<String>("room") {
        println!("{}", io::format_room_schedule(&artifact, room, term)?);
    } else {
        println!("{}", io::format_report(&stats::generate(&artifact)));
    }
    Ok(())
}

fn exit_code(err: &Error) -> exitcode::ExitCode {
    match err {
        Error::Io(_) => exitcode::IOERR,
        Error::Input(_) | Error::EmptyProblem(_) | Error::UnknownEntity { .. } => {
            exitcode::DATAERR
        }
        Error::Infeasible | Error::NoIncumbent(_) | Error::NoSchedule { .. } => {
            exitcode::UNAVAILABLE
        }
        Error::InconsistentSchedule(_) => exitcode::SOFTWARE,
    }
}
