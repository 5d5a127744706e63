use chrono::Utc;
use finite_core::{Config, Database, Event};
use serde::Serialize;

#[derive(Serialize)]
struct Status {
    life: Option<Event>,
    motto: String,
    events: Vec<Event>,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let now = Utc::now();

    let life = config
        .life_target()?
        .map(|target| Event::tick(None, "Life", &target.evaluate(now), now));

    let mut events = Vec::new();
    for event in db.list_events()? {
        let snapshot = event.to_target()?.evaluate(now);
        events.push(Event::tick(Some(event.id.clone()), event.name.clone(), &snapshot, now));
    }

    let status = Status {
        life,
        motto: config.life.motto,
        events,
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
