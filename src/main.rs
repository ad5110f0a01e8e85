use std::rc::Rc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use medialist::layout::{Point, Rect};
use medialist::models::{
    ChannelId, FullMsgId, InMemoryStore, ListMemento, Media, MediaKind, MessageInfo, PeerContext,
    PeerId,
};
use medialist::ui::{ContextMenuSource, Effect, ListEvent, ListWidget, PointerEvent};
use medialist::ListConfig;

const WIDTH: i32 = 640;
const VIEWPORT_HEIGHT: i32 = 720;
const HISTORY_LEN: i64 = 240;

/// Plays the host: answers slice requests from the store and follows scroll
/// requests, logging everything else.
struct DemoHost {
    store: Rc<InMemoryStore>,
    scroll_top: i32,
}

impl DemoHost {
    fn pump(&mut self, widget: &mut ListWidget) {
        // Answering a request can produce another one; stop if that never settles.
        for _ in 0..16 {
            let effects = widget.take_effects();
            if effects.is_empty() {
                return;
            }
            for effect in effects {
                self.apply(widget, effect);
            }
        }
        warn!("Effects did not settle");
    }

    fn apply(&mut self, widget: &mut ListWidget, effect: Effect) {
        match effect {
            Effect::RequestSlice(request) => {
                let slice = self.store.slice(widget.kind(), &request);
                widget.handle(ListEvent::SliceReady {
                    generation: request.generation,
                    slice: Box::new(slice),
                });
            }
            Effect::ScrollTo(top) => {
                info!(top, "Scroll restored");
                self.scroll_to(widget, top);
            }
            Effect::HeightChanged(height) => debug!(height, "Height changed"),
            Effect::Repaint(_) | Effect::RepaintAll => {}
            Effect::SelectionChanged(items) => {
                info!(count = items.list.len(), "Selection changed");
            }
            Effect::Command(command) => info!(?command, "Command"),
            other => debug!(effect = ?other, "Effect"),
        }
    }

    fn scroll_to(&mut self, widget: &mut ListWidget, top: i32) {
        self.scroll_top = top.clamp(0, (widget.height() - VIEWPORT_HEIGHT).max(0));
        widget.handle(ListEvent::Viewport {
            top: self.scroll_top,
            bottom: self.scroll_top + VIEWPORT_HEIGHT,
        });
    }
}

fn demo_history(peer: PeerContext) -> Vec<MessageInfo> {
    (1..=HISTORY_LEN)
        .filter_map(|msg| {
            let month = 1 + ((msg - 1) / 40) as u32;
            let day = 1 + (msg % 28) as u32;
            let date = NaiveDate::from_ymd_opt(2017, month, day)?.and_hms_opt(12, 0, 0)?;
            let info = MessageInfo::new(FullMsgId::new(peer.channel, msg), peer.peer, date)
                .with_media(Media::Photo {
                    width: 1280,
                    height: 960,
                });
            Some(info)
        })
        .collect()
}

fn click(widget: &mut ListWidget, host: &mut DemoHost, point: Point, time_ms: u64) {
    widget.handle(ListEvent::MousePress(PointerEvent::left(point, time_ms)));
    widget.handle(ListEvent::MouseRelease(PointerEvent::left(point, time_ms + 60)));
    host.pump(widget);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medialist=info".parse()?),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ListConfig::load(&path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => ListConfig::default(),
    };

    let peer = PeerContext::new(PeerId(1), Some(ChannelId(1)), None);
    let store = Rc::new(InMemoryStore::new(peer));
    let inserted = store.insert_batch(demo_history(peer));
    info!(inserted, "Seeded demo history");

    let mut widget = ListWidget::new(peer, MediaKind::Photo, store.clone(), config.clone());
    let mut host = DemoHost {
        store: store.clone(),
        scroll_top: 0,
    };
    widget.handle(ListEvent::Resize { width: WIDTH });
    host.pump(&mut widget);
    host.scroll_to(&mut widget, 0);
    host.pump(&mut widget);
    info!(
        sections = widget.sections().len(),
        height = widget.height(),
        "Initial window loaded"
    );

    for step in 1..=6 {
        host.scroll_to(&mut widget, step * VIEWPORT_HEIGHT);
        host.pump(&mut widget);
        let (around, limit) = widget.window();
        info!(
            scroll_top = host.scroll_top,
            %around,
            limit,
            loaded = widget.slice().len(),
            "Scrolled"
        );
    }

    let top = host.scroll_top;
    let Some(first) = widget.find_item_by_point(Point::new(WIDTH / 4, top + 40)) else {
        anyhow::bail!("No item under the viewport top");
    };
    let center = Point::new(
        first.geometry.x + first.geometry.width / 2,
        first.geometry.y + first.geometry.height / 2,
    );
    click(&mut widget, &mut host, center, 10_000);

    widget.toggle_item_selection(first.id);
    if let Some(next) = widget.find_item_by_point(Point::new(WIDTH / 2, center.y)) {
        widget.toggle_item_selection(next.id);
    }
    host.pump(&mut widget);
    widget.forward_selected();
    host.pump(&mut widget);

    if let Some(menu) = widget.context_menu(center, ContextMenuSource::Mouse) {
        info!(labels = ?menu.labels(), "Context menu");
        widget.context_menu_closed();
    }
    widget.clear_selected();
    host.pump(&mut widget);

    let removed = store.peer().full_id(first.id);
    store.remove(removed);
    widget.process_store_updates();
    host.pump(&mut widget);
    info!(height = widget.height(), "Removed an item");

    let mut memento = ListMemento::default();
    widget.save_state(&mut memento);
    let saved = serde_json::to_string(&memento).context("Failed to serialize memento")?;
    info!(memento = %saved, "Saved list state");

    let mut restored = ListWidget::new(peer, MediaKind::Photo, store.clone(), config);
    restored.handle(ListEvent::Resize { width: WIDTH });
    restored
        .restore_state(&memento)
        .context("Failed to restore list state")?;
    let mut restored_host = DemoHost {
        store,
        scroll_top: 0,
    };
    restored_host.pump(&mut restored);
    info!(
        scroll_top = restored_host.scroll_top,
        original = host.scroll_top,
        "Restored list state"
    );

    let visible = Rect::new(0, restored_host.scroll_top, WIDTH, VIEWPORT_HEIGHT);
    info!(commands = restored.render(visible).len(), "Rendered viewport");
    Ok(())
}
