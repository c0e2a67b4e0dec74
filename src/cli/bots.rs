//! CLI command listing the sample bots.

use rising_tide::SampleBot;

/// Execute the `bots` command.
pub(crate) fn execute() {
    println!("Sample bots:");
    println!();
    println!("{:<6} {:<20} Style", "Code", "Name");
    println!("{:-<6} {:-<20} {:-<40}", "", "", "");

    for bot in SampleBot::ALL {
        println!("{:<6} {:<20} {}", bot.code(), bot.name(), bot.description());
    }

    println!();
    println!("Use the codes with 'rising-tide run' or 'rising-tide tournament'.");
}
