//! Example: Basic usage of fOS UI
//!
//! Run with `RUST_LOG=debug` to watch builds and patches.

use fos_ui::{App, Component, ComponentType, Config, Context, Props, Template, UiResult};
use serde_json::json;
use tracing_subscriber::EnvFilter;

struct Clock;

impl Component for Clock {
    fn create(_props: &Props) -> Self {
        Clock
    }

    fn render(&self, cx: &mut Context<'_>) -> UiResult<Template> {
        let time = cx.state_str("time").unwrap_or("--:--");
        Ok(format!(
            r#"
            <div class="clock">
                <span class="time">{time}</span>
            </div>
            "#
        )
        .into())
    }

    fn on_load(&self, cx: &mut Context<'_>) -> UiResult<()> {
        cx.on_load_children()?;
        cx.register_state(json!({"time": "--:--"}))?;
        cx.subscribe("tick")
    }

    fn notify(&self, cx: &mut Context<'_>, notification: &fos_ui::Notification) -> UiResult<()> {
        cx.set_state("time", notification.data.clone())?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut app = App::new(Config::default());
    let container = app.build(r#"<main id="app"></main>"#)?;
    let root = app.tree().root();
    app.tree_mut().append_child(root, container)?;

    app.render(ComponentType::of::<Clock>(), "#app", Props::new())?;
    println!("fOS UI v{} mounted: {}", fos_ui::VERSION, app.tree().outer_html(root));

    for time in ["12:00", "12:01", "12:01"] {
        app.publish("tick", json!(time))?;
        println!("{}", app.tree().outer_html(root));
    }
    Ok(())
}
