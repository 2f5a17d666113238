//! Command-line entry point: learn a one-counter automaton for a fixture
//! language and print the result.

use clap::{Parser, Subcommand, ValueEnum};
use onecounter_core::alphabet::BasicAlphabet;
use onecounter_core::{format, Learner};
use onecounter_teachers::{languages, AutomaticTeacher, PredicateR1caTeacher};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onecounter", version, about = "Active learning of one-counter automata")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Learn a V1CA for a fixture language, printing the textual automaton
    /// format (spec.md §6) to stdout.
    LearnV1ca {
        #[arg(value_enum, default_value_t = V1caFixture::Anbn)]
        language: V1caFixture,
        #[arg(long)]
        verbose: bool,
    },
    /// Learn an R1CA for the `a^n b a^n` fixture language.
    LearnR1ca {
        #[arg(long, default_value_t = 6)]
        max_len: usize,
        #[arg(long)]
        verbose: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum V1caFixture {
    Anbn,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::LearnV1ca { language, verbose } => run_learn_v1ca(language, verbose),
        Command::LearnR1ca { max_len, verbose } => run_learn_r1ca(max_len, verbose),
    }
}

fn run_learn_v1ca(language: V1caFixture, verbose: bool) {
    let alphabet = languages::anbn_alphabet();
    let teacher = match language {
        V1caFixture::Anbn => AutomaticTeacher::new(languages::anbn_reference()),
    };
    let mut learner = Learner::new(teacher);
    match learner.learn_v1ca(&alphabet, verbose) {
        Ok(automaton) => {
            let parsed = format::v1ca_to_parsed(&automaton);
            print!("{}", format::write(&parsed));
        }
        Err(e) => {
            tracing::error!(error = %e, "learn_v1ca failed");
            std::process::exit(1);
        }
    }
}

fn run_learn_r1ca(max_len: usize, verbose: bool) {
    let alphabet = BasicAlphabet::new(['a', 'b']);
    let teacher = PredicateR1caTeacher::new(
        languages::an_b_am,
        languages::an_b_am_counter,
        alphabet.clone(),
        max_len,
    );
    let mut learner = Learner::new(teacher);
    match learner.learn_r1ca(&alphabet, verbose) {
        Ok(automaton) => {
            println!("learned R1CA with {} states", automaton.num_states());
        }
        Err(e) => {
            tracing::error!(error = %e, "learn_r1ca failed");
            std::process::exit(1);
        }
    }
}
