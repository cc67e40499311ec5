//! Battle odds engine for a tabletop wargame's field-combat rules.
//!
//! Two armies of men-at-arms and knights, with optional fortifications and
//! leaders, fight dice-resolved rounds until one side (or both) is wiped out.
//! [battle::BattleCache] accumulates outcome statistics per canonical battle
//! state and recursively improves them; [estimator] runs fixed-iteration
//! Monte Carlo playouts for ad-hoc pairs without touching the shared cache.

pub mod battle;
pub mod cli;
pub mod estimator;
pub mod parallel;
