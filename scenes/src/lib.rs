#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scenes of the Flow Defence application and the stack that switches between them.
//!
//! The [`App`] owns a stack of [`Scene`]s. Each frame it reacts to the
//! application-level input events, then lets the scene on top update, draw
//! itself into the [`Frame`] and describe its overlay panel.

mod atlas;
mod battleground;
mod config;
mod editor;

use std::time::Duration;

use flow_defence_core::{EventType, ScreenTransform};
use flow_defence_rendering::{DrawCommand, Frame, FrameInput, GuiPanel};
use flow_defence_world::LevelStore;

pub use battleground::{BattleStats, Battleground};
pub use config::{
    AssetsConfig, BattlegroundConfig, CombatConfig, ConfigError, GridConfig, MovementConfig,
    TransformConfig, ViewportConfig,
};
pub use editor::Editor;

/// Screen the application can show.
#[derive(Debug)]
pub enum Scene {
    /// Playable battleground.
    Battleground(Box<Battleground>),
    /// Level editor.
    Editor(Box<Editor>),
}

impl Scene {
    /// Runs one frame of the scene.
    pub fn update(&mut self, dt: Duration, input: &FrameInput) {
        match self {
            Self::Battleground(battleground) => battleground.tick(dt, input),
            Self::Editor(editor) => editor.update(input),
        }
    }

    /// Appends the sprites of the scene.
    pub fn render(&self, out: &mut Vec<DrawCommand>) {
        match self {
            Self::Battleground(battleground) => battleground.render(out),
            Self::Editor(editor) => editor.render(out),
        }
    }

    /// Overlay panel describing the scene.
    #[must_use]
    pub fn show_gui(&self) -> GuiPanel {
        match self {
            Self::Battleground(battleground) => battleground.gui(),
            Self::Editor(editor) => editor.gui(),
        }
    }

    /// Called when the scene becomes the top of the stack.
    pub fn on_activation(&mut self) {
        match self {
            Self::Battleground(battleground) => battleground.on_activation(),
            Self::Editor(editor) => editor.on_activation(),
        }
    }

    /// Called when the scene stops being the top of the stack.
    pub fn on_deactivation(&mut self) {
        match self {
            Self::Battleground(battleground) => battleground.on_deactivation(),
            Self::Editor(editor) => editor.on_deactivation(),
        }
    }
}

/// Scene stack driven once per frame by a rendering backend.
#[derive(Debug)]
pub struct App {
    stack: Vec<Scene>,
    parked_editor: Option<Box<Editor>>,
    levels: LevelStore,
    transform: ScreenTransform,
}

impl App {
    /// Creates an application showing `battleground`.
    ///
    /// Editors opened later read and write levels through `levels`.
    #[must_use]
    pub fn new(battleground: Battleground, levels: LevelStore, transform: ScreenTransform) -> Self {
        let mut app = Self {
            stack: Vec::new(),
            parked_editor: None,
            levels,
            transform,
        };
        app.push(Scene::Battleground(Box::new(battleground)));
        app
    }

    /// Scene currently on top of the stack.
    #[must_use]
    pub fn current(&self) -> Option<&Scene> {
        self.stack.last()
    }

    /// Number of stacked scenes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Puts `scene` on top of the stack.
    pub fn push(&mut self, mut scene: Scene) {
        if let Some(top) = self.stack.last_mut() {
            top.on_deactivation();
        }
        scene.on_activation();
        self.stack.push(scene);
    }

    /// Removes the top scene. The bottom scene is never removed.
    pub fn pop(&mut self) -> Option<Scene> {
        if self.stack.len() <= 1 {
            return None;
        }
        let mut scene = self.stack.pop()?;
        scene.on_deactivation();
        if let Some(top) = self.stack.last_mut() {
            top.on_activation();
        }
        Some(scene)
    }

    /// Handles application events, then updates and draws the top scene into `frame`.
    pub fn update(&mut self, dt: Duration, input: &FrameInput, frame: &mut Frame) {
        for event in input.events.iter() {
            match event.kind {
                EventType::SHOW_BATTLEGROUND => self.show_battleground(),
                EventType::SHOW_EDITOR => self.show_editor(),
                EventType::STOP => frame.request_exit(),
                _ => {}
            }
        }

        if let Some(scene) = self.stack.last_mut() {
            scene.update(dt, input);
            scene.render(&mut frame.draws);
            frame.panels.push(scene.show_gui());
        }
    }

    fn show_battleground(&mut self) {
        while self.stack.len() > 1 {
            if let Some(Scene::Editor(editor)) = self.pop() {
                self.parked_editor = Some(editor);
            }
        }
    }

    fn show_editor(&mut self) {
        if matches!(self.stack.last(), Some(Scene::Editor(_))) {
            return;
        }
        let editor = self
            .parked_editor
            .take()
            .unwrap_or_else(|| Box::new(Editor::new(self.levels.clone(), self.transform)));
        self.push(Scene::Editor(editor));
    }
}
