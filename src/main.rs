use std::io;

use anyhow::Context;
use clap::Parser;
use diceprob::{Expr, Limits, ParseError, Strategy};
use rand::{SeedableRng, rngs::StdRng};

/// Print the chance of every outcome of a dice expression such as `2d6+3>10`.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Expression to evaluate; one line is read from standard input if omitted.
    expression: Option<String>,
    #[arg(long, value_enum, default_value_t = Strategy::Descent)]
    parser: Strategy,
    /// Print this many random rolls instead of the distribution.
    #[arg(long)]
    rolls: Option<usize>,
    /// Seed for `--rolls`.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = Limits::default().max_depth)]
    max_depth: usize,
    #[arg(long, default_value_t = Limits::default().max_dice)]
    max_dice: usize,
    #[arg(long, default_value_t = Limits::default().max_nodes)]
    max_nodes: usize,
    #[arg(long, default_value_t = Limits::default().max_outcomes)]
    max_outcomes: usize,
    #[arg(long, default_value_t = Limits::default().max_pairs)]
    max_pairs: usize,
}

impl Args {
    fn limits(&self) -> Limits {
        Limits {
            max_depth: self.max_depth,
            max_dice: self.max_dice,
            max_nodes: self.max_nodes,
            max_outcomes: self.max_outcomes,
            max_pairs: self.max_pairs,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let line = match &args.expression {
        Some(expression) => expression.clone(),
        None => {
            let mut line = String::new();
            io::stdin().read_line(&mut line).context("reading the expression")?;
            line
        }
    };
    let limits = args.limits();
    let expr = match Expr::parse_with(&line, args.parser, &limits) {
        Ok(expr) => expr,
        Err(ParseError::Empty) => {
            log::info!("nothing to evaluate");
            return Ok(());
        }
        Err(err) => return Err(err).with_context(|| format!("parsing {:?}", line.trim_end())),
    };
    log::info!("evaluating {expr}");
    match args.rolls {
        Some(n) => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            for _ in 0..n {
                println!("{}", expr.roll(&mut rng)?);
            }
        }
        None => {
            let dist = expr.dist_with::<f64>(&limits).with_context(|| format!("evaluating {expr}"))?;
            log::info!("{} outcomes", dist.len());
            println!("{dist}");
        }
    }
    Ok(())
}
