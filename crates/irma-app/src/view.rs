use irma_core::WorldView;
use tracing::info;

/// Headless view: cell updates are dropped, status lines go to the log.
#[derive(Debug, Default)]
pub struct TracingView {
    last_title: Option<String>,
}

impl TracingView {
    #[must_use]
    pub fn last_title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }
}

impl WorldView for TracingView {
    fn dot(&mut self, _x: u32, _y: u32, _color: u32) {}

    fn empty(&mut self, _x: u32, _y: u32) {}

    fn title(&mut self, text: &str) {
        info!(target: "irma::status", "{text}");
        self.last_title = Some(text.to_owned());
    }
}
