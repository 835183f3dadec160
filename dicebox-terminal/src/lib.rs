/// Terminal host for the dice scene
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use dicebox_core::projection::ZOOM_STEP;
use dicebox_core::{Command, Scene, ShadingMode};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Nominal pixel size of one terminal cell; cells are about twice as tall as wide
const CELL_WIDTH: u32 = 8;
const CELL_HEIGHT: u32 = 16;
/// Radians per key press when turning the view
const VIEW_STEP: f32 = 0.1;
/// Degrees per key press when changing the spin speed
const SPIN_SPEED_STEP: f32 = 0.5;

/// Main application struct for the interactive dice scene
pub struct TerminalApp {
    scene: Scene,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    last_tick: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene, shading: ShadingMode) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let mut renderer = AsciiRenderer::new(width as usize, height as usize);
        renderer.shading = shading;

        let mut app = Self {
            scene,
            renderer,
            running: true,
            last_frame: Instant::now(),
            last_tick: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        };
        app.resize(width, height);
        Ok(app)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(event);
            }

            // Update
            let dt = self.last_tick.elapsed().as_secs_f32();
            self.last_tick = Instant::now();
            self.scene.advance(dt);

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.renderer.resize(columns as usize, rows as usize);
        let (width, height) = self.pixel_viewport();
        self.scene.resize(width, height);
    }

    fn pixel_viewport(&self) -> (u32, u32) {
        (
            self.renderer.width() as u32 * CELL_WIDTH,
            self.renderer.height() as u32 * CELL_HEIGHT,
        )
    }

    fn send(&mut self, command: Command) {
        let viewport = self.pixel_viewport();
        if let Err(err) = self.scene.apply(command, viewport) {
            log::warn!("{}", err);
        }
    }

    /// Map one terminal event onto the scene
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(columns, rows) => self.resize(columns, rows),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let spin_speed = self.scene.simulation().config().spin_speed;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char(' ') | KeyCode::Enter => self.send(Command::RollAll),
            KeyCode::Char(digit @ '0'..='9') => {
                let count = match digit.to_digit(10) {
                    Some(0) | None => 10,
                    Some(n) => n as usize,
                };
                self.send(Command::SetDieCount(count));
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.send(Command::SetSpinSpeed(spin_speed + SPIN_SPEED_STEP));
            }
            KeyCode::Char('-') => {
                self.send(Command::SetSpinSpeed(spin_speed - SPIN_SPEED_STEP));
            }
            KeyCode::Char('m') => {
                self.renderer.shading = self.renderer.shading.next();
            }
            KeyCode::Char('p') => self.scene.camera_mut().toggle_mode(),
            KeyCode::Char('z') => self.send(Command::Zoom(-ZOOM_STEP)),
            KeyCode::Char('x') => self.send(Command::Zoom(ZOOM_STEP)),
            KeyCode::Char('w') | KeyCode::Up => self.turn(0.0, VIEW_STEP),
            KeyCode::Char('s') | KeyCode::Down => self.turn(0.0, -VIEW_STEP),
            KeyCode::Char('a') | KeyCode::Left => self.turn(-VIEW_STEP, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.turn(VIEW_STEP, 0.0),
            _ => {}
        }
    }

    fn turn(&mut self, yaw: f32, pitch: f32) {
        self.send(Command::RotateView { yaw, pitch });
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Up(MouseButton::Left) => {
                let x = (mouse.column as f32 + 0.5) * CELL_WIDTH as f32;
                let y = (mouse.row as f32 + 0.5) * CELL_HEIGHT as f32;
                self.send(Command::RollAt { x, y });
            }
            MouseEventKind::ScrollUp => self.send(Command::Zoom(-ZOOM_STEP)),
            MouseEventKind::ScrollDown => self.send(Command::Zoom(ZOOM_STEP)),
            _ => {}
        }
    }

    /// Draw every die into the renderer buffers without touching the terminal
    pub fn compose(&mut self) {
        self.renderer.clear();
        let mesh = &self.scene.model().mesh;
        for model_matrix in self.scene.model_matrices() {
            self.renderer
                .render_mesh(mesh, &model_matrix, self.scene.camera());
        }
    }

    fn status_line(&self) -> String {
        let faces: Vec<String> = self
            .scene
            .simulation()
            .faces()
            .iter()
            .map(|face| face.map_or_else(|| "*".to_string(), |face| face.to_string()))
            .collect();
        format!(
            "dicebox | {:?} | dice: {} | shading: {} | spin: {:.2}° | FPS: {:.1} | Space=Roll 0-9=Count +/-=Speed M=Shading P=Projection Z/X=Zoom WASD=View Q=Quit",
            self.scene.simulation().mode(),
            faces.join(" "),
            self.renderer.shading,
            self.scene.simulation().config().spin_speed,
            self.fps
        )
    }

    fn render(&mut self) -> io::Result<()> {
        self.compose();

        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let mut status = self.status_line();
        status.truncate(
            status
                .char_indices()
                .nth(self.renderer.width())
                .map_or(status.len(), |(index, _)| index),
        );
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
