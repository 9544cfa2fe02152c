//! The DeepMind Control tasks used in the sweeps, in their `dmc_<domain>_<task>` short form.

pub const DMC20: [&str; 20] = [
    "dmc_cartpole_swingup",
    "dmc_cartpole_balance_sparse",
    "dmc_cup_catch",
    "dmc_reacher_hard",
    "dmc_finger_turn_hard",
    "dmc_cheetah_run",
    "dmc_finger_spin",
    "dmc_walker_run",
    "dmc_cartpole_swingup_sparse",
    "dmc_hopper_stand",
    "dmc_hopper_hop",
    "dmc_quadruped_walk",
    "dmc_quadruped_run",
    "dmc_pendulum_swingup",
    "dmc_acrobot_swingup",
    "dmc_walker_walk",
    "dmc_cartpole_balance",
    "dmc_finger_turn_easy",
    "dmc_reacher_easy",
    "dmc_walker_stand",
];

/// DMC20 without the quadruped tasks.
pub const DMC18: [&str; 18] = [
    "dmc_cartpole_swingup",
    "dmc_cartpole_balance_sparse",
    "dmc_cup_catch",
    "dmc_reacher_hard",
    "dmc_finger_turn_hard",
    "dmc_cheetah_run",
    "dmc_finger_spin",
    "dmc_walker_run",
    "dmc_cartpole_swingup_sparse",
    "dmc_hopper_stand",
    "dmc_hopper_hop",
    "dmc_pendulum_swingup",
    "dmc_acrobot_swingup",
    "dmc_walker_walk",
    "dmc_cartpole_balance",
    "dmc_finger_turn_easy",
    "dmc_reacher_easy",
    "dmc_walker_stand",
];

/// `dmc_cartpole_balance_sparse` -> `control:cartpole:balance_sparse`. The `cup` domain is
/// registered as `ball_in_cup`.
pub fn dmc_to_control(name: &str) -> String {
    let rest = name.strip_prefix("dmc_").unwrap_or(name);
    let rest = rest.replacen('_', ":", 1);
    format!("control:{rest}").replace(":cup:", ":ball_in_cup:")
}

pub fn control_tasks(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| dmc_to_control(name)).collect()
}
