//! Short human-readable lines describing what an agent is doing.
//!
//! Used for history entries. The caller picks the variant (usually the
//! tick number) so output stays deterministic.

use townsfolk_types::Activity;

/// Describe `name` performing `activity`. `variant` selects one of a few
/// phrasings.
pub fn describe_activity(name: &str, activity: Activity, variant: u64) -> String {
    let lines: [String; 3] = match activity {
        Activity::Rest => [
            format!("{name} is resting."),
            format!("{name} takes a break."),
            format!("{name} is recovering their strength."),
        ],
        Activity::Work => [
            format!("{name} is working hard."),
            format!("{name} is busy with their trade."),
            format!("{name} concentrates on the job."),
        ],
        Activity::Meal => [
            format!("{name} is having a meal."),
            format!("{name} savors their food."),
            format!("{name} stops for a bite."),
        ],
        Activity::Social => [
            format!("{name} chats with others."),
            format!("{name} shares a friendly moment."),
            format!("{name} is deep in conversation."),
        ],
        Activity::Leisure => [
            format!("{name} enjoys some leisure time."),
            format!("{name} is having fun."),
            format!("{name} takes it easy."),
        ],
    };
    let [first, second, third] = lines;
    match variant % 3 {
        0 => first,
        1 => second,
        _ => third,
    }
}
