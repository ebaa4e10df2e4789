pub mod game_profile;
pub mod r#match;
pub mod match_participant;
pub mod notification;
pub mod order;
pub mod profile;
pub mod reward;
pub mod team;
pub mod team_member;
pub mod tournament;
pub mod tournament_participant;
pub mod transaction;
pub mod user;
pub mod user_reward;
