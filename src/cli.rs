use crate::battle::{
    export_odds_csv, Army, ArmyLeader, BattleCache, CancelToken, DefensiveStructure, Rng,
    SweepOrder, MAX_KNIGHTS, MAX_MEN_AT_ARMS, RELIABILITY_THRESHOLD,
};
use crate::estimator::estimate_battle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Estimate,
    Table,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("estimate") => Some(Command::Estimate),
        Some("table") => Some(Command::Table),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Estimate) => handle_estimate(args),
        Some(Command::Table) => handle_table(args),
        None => {
            eprintln!("usage: fiefsim <estimate|table>");
            2
        }
    }
}

const ESTIMATE_USAGE: &str = "usage: fiefsim estimate <a_men> <a_knights> <a_leader> \
<a_structure> <b_men> <b_knights> <b_leader> <b_structure> [seed]";

fn handle_estimate(args: &[String]) -> i32 {
    if args.len() < 10 {
        eprintln!("{ESTIMATE_USAGE}");
        return 2;
    }
    let (side_a, side_b) = match (parse_army(&args[2..6]), parse_army(&args[6..10])) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("{err}");
            eprintln!("{ESTIMATE_USAGE}");
            return 2;
        }
    };
    let mut rng = match args.get(10) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(seed) => Rng::new(seed),
            Err(_) => {
                eprintln!("invalid seed '{raw}'");
                return 2;
            }
        },
        None => Rng::from_entropy(),
    };

    let rates = estimate_battle(&side_a, &side_b, &mut rng);
    match serde_json::to_string_pretty(&rates) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize estimate: {err}");
            1
        }
    }
}

fn handle_table(args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: fiefsim table <out.csv> [limit] [seed]");
        return 2;
    };
    let limit = parse_u64_arg(args.get(3), "limit", RELIABILITY_THRESHOLD);
    let seed = parse_u64_arg(args.get(4), "seed", 7);

    let mut cache = BattleCache::new();
    let mut rng = Rng::new(seed);
    let cancel = CancelToken::new();

    let populated = cache.populate(&mut rng, &cancel);
    eprintln!("populate done: {populated} starting configurations");
    let completed = cache.complete(limit, SweepOrder::LeastSampledFirst, &mut rng, &cancel);
    eprintln!("complete done: {completed} cached states topped up to {limit} samples");

    match export_odds_csv(&cache, path) {
        Ok(()) => {
            println!("table written: states={}, path={path}", cache.len());
            0
        }
        Err(err) => {
            eprintln!("failed to write odds table: {err}");
            1
        }
    }
}

/// Parse `<men> <knights> <leader> <structure>`.
fn parse_army(fields: &[String]) -> Result<Army, String> {
    let men_at_arms = parse_count(fields.first(), "men-at-arms", MAX_MEN_AT_ARMS)?;
    let knights = parse_count(fields.get(1), "knights", MAX_KNIGHTS)?;
    let leader = parse_leader(fields.get(2))?;
    let structure = parse_structure(fields.get(3))?;
    Ok(Army {
        men_at_arms,
        knights,
        structure,
        leader,
    })
}

fn parse_count(raw: Option<&String>, name: &str, max: u8) -> Result<u8, String> {
    let Some(raw) = raw else {
        return Err(format!("missing {name}"));
    };
    let value: u8 = raw
        .parse()
        .map_err(|_| format!("invalid {name} '{raw}'"))?;
    if value > max {
        return Err(format!("{name} {value} exceeds the limit of {max}"));
    }
    Ok(value)
}

fn parse_leader(raw: Option<&String>) -> Result<ArmyLeader, String> {
    match raw.map(String::as_str) {
        Some("none") | Some("lady") => Ok(ArmyLeader::NoneOrLady),
        Some("lord") => Ok(ArmyLeader::LordOrTitledLady),
        Some("darc") => Ok(ArmyLeader::Darc),
        Some(other) => Err(format!(
            "invalid leader '{other}' (expected none|lady|lord|darc)"
        )),
        None => Err("missing leader".to_string()),
    }
}

fn parse_structure(raw: Option<&String>) -> Result<DefensiveStructure, String> {
    match raw.map(String::as_str) {
        Some("none") => Ok(DefensiveStructure::None),
        Some("stronghold") => Ok(DefensiveStructure::Stronghold),
        Some("city") => Ok(DefensiveStructure::FortifiedCity),
        Some(other) => Err(format!(
            "invalid structure '{other}' (expected none|stronghold|city)"
        )),
        None => Err("missing structure".to_string()),
    }
}

fn parse_u64_arg(raw: Option<&String>, name: &str, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}
