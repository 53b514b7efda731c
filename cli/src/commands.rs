use std::io::Write;
use std::time::Duration;

use ancestral_core::{
    ClientId, DiceKind, Dispatch, Intent, IntentReply, ServerConfig, ServerConfigExt,
};

use crate::context::CliContext;

/// Send `intent` as the acting client and print the direct reply.
async fn send(ctx: &CliContext, intent: Intent) {
    let client = ctx.acting().await;
    match ctx.server.handle(client.clone(), intent).await {
        Ok(IntentReply::Done) => {}
        Ok(IntentReply::Room(code)) => println!("{client} is in room {code}"),
        Ok(IntentReply::Rolled(values)) => println!("{client} rolled {values:?}"),
        Err(e) => println!("error: {e}"),
    }
}

pub fn print_dispatch(dispatch: &Dispatch) {
    let recipients: Vec<&str> = dispatch.recipients.iter().map(ClientId::as_str).collect();
    match serde_json::to_string(&dispatch.event) {
        Ok(json) => println!(
            "[{}] {} -> {}: {json}",
            dispatch.room,
            dispatch.event.name(),
            recipients.join(",")
        ),
        Err(e) => println!("[{}] {} (unprintable: {e})", dispatch.room, dispatch.event.name()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Console
// ─────────────────────────────────────────────────────────────────────────────

pub async fn act_as(ctx: &CliContext, client: &str) {
    ctx.set_acting(ClientId::from(client)).await;
    println!("acting as {client}");
}

pub async fn whoami(ctx: &CliContext) {
    let client = ctx.acting().await;
    match ctx.server.room_of(&client).await {
        Some(code) => println!("{client} (room {code})"),
        None => println!("{client} (no room)"),
    }
}

pub async fn show_room(ctx: &CliContext) {
    let client = ctx.acting().await;
    let Some(code) = ctx.server.room_of(&client).await else {
        println!("{client} is not in a room");
        return;
    };
    let Some(snapshot) = ctx.server.room_snapshot(&code).await else {
        println!("room {code} is gone");
        return;
    };
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("error: {e}"),
    }
}

pub fn list_characters(ctx: &CliContext) {
    println!("{:<12} {:<24} {:<12} {:>4} {:>4} {:>4} {:>4}", "Id", "Name", "Region", "HP", "ATK", "DEF", "SPD");
    println!("{}", "-".repeat(72));
    for c in ctx.catalog.characters() {
        let b = &c.base;
        println!(
            "{:<12} {:<24} {:<12} {:>4} {:>4} {:>4} {:>4}",
            c.id, c.name, c.region, b.health, b.attack, b.defense, b.speed
        );
        for a in &c.abilities {
            println!("    {:<20} {:?} cost={} cd={}", a.id, a.kind, a.cost, a.cooldown);
        }
    }
}

pub fn list_enemies(ctx: &CliContext) {
    for e in ctx.catalog.enemies() {
        let abilities: Vec<&str> = e.abilities.iter().map(|a| a.id.as_str()).collect();
        println!("{:<16} {:<24} hp={:<4} [{}]", e.id, e.name, e.base.health, abilities.join(", "));
    }
}

pub fn show_config(ctx: &CliContext) {
    match serde_json::to_string_pretty(ctx.config.as_ref()) {
        Ok(json) => println!("{json}"),
        Err(e) => println!("error: {e}"),
    }
    if let Ok(path) = ServerConfig::path() {
        println!("stored at {}", path.display());
    }
}

pub fn save_config(ctx: &CliContext) {
    match ctx.config.save() {
        Ok(()) => println!("configuration saved"),
        Err(e) => println!("error: {e}"),
    }
}

pub fn exit() {
    println!("quitting...");
    let _ = std::io::stdout().flush();
}

// ─────────────────────────────────────────────────────────────────────────────
// Intents
// ─────────────────────────────────────────────────────────────────────────────

pub async fn create_room(ctx: &CliContext, name: Option<String>) {
    send(ctx, Intent::CreateRoom { name }).await;
}

pub async fn join_room(ctx: &CliContext, code: &str, name: Option<String>) {
    let code = code.to_string();
    send(ctx, Intent::JoinRoom { code, name }).await;
}

pub async fn pick(ctx: &CliContext, character: &str) {
    let intent = Intent::UpdatePlayer {
        character: Some(character.to_string()),
        ready: None,
    };
    send(ctx, intent).await;
}

pub async fn ready(ctx: &CliContext, ready: bool) {
    let intent = Intent::UpdatePlayer {
        character: None,
        ready: Some(ready),
    };
    send(ctx, intent).await;
}

pub async fn start_story(ctx: &CliContext) {
    send(ctx, Intent::StartStory).await;
}

pub async fn start_vote(
    ctx: &CliContext,
    node: Option<String>,
    options: Vec<String>,
    secs: Option<u64>,
) {
    let intent = Intent::StartVote {
        node,
        options: (!options.is_empty()).then_some(options),
        duration: secs.map(Duration::from_secs),
    };
    send(ctx, intent).await;
}

pub async fn cast_vote(ctx: &CliContext, option: &str) {
    let option = option.to_string();
    send(ctx, Intent::CastVote { option }).await;
}

pub async fn start_battle(ctx: &CliContext, boss: Option<String>) {
    send(ctx, Intent::StartBattle { boss }).await;
}

pub async fn use_ability(ctx: &CliContext, ability: &str) {
    let ability = ability.to_string();
    send(ctx, Intent::PerformAbility { ability }).await;
}

pub async fn boss_turn(ctx: &CliContext) {
    send(ctx, Intent::BossTurn).await;
}

pub async fn roll(ctx: &CliContext, villain: bool) {
    let kind = if villain { DiceKind::Villain } else { DiceKind::D20 };
    send(ctx, Intent::RollDice { kind }).await;
}

pub async fn leave(ctx: &CliContext) {
    send(ctx, Intent::Disconnect).await;
}
