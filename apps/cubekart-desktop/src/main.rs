use anyhow::Result;
use clap::Parser;
use cubekart_physics::{DriveMode, DriveSequencer, PhysicsWorld, Vehicle};
use cubekart_render::{
    Camera, Entity, Gfx, Light, Renderable, SkyConstants, SkyPalette, build_scene_renderable,
    build_sky_renderable, cube_mesh, projection, sphere_mesh,
};
use egui::Context as EguiContext;
use glam::{EulerRot, Mat3, Mat4, Vec3};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const CHASSIS_HALF: Vec3 = Vec3::new(1.0, 0.5, 2.0);
const MISSILE_RADIUS: f32 = 0.4;
const MISSILE_SPEED: f32 = 25.0;

const FOLLOW_CAMERA: usize = 0;
const FREE_CAMERA: usize = 1;

#[derive(Parser)]
#[command(name = "cubekart-desktop", about = "Cubekart vehicle demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Start with keyboard control instead of the autopilot
    #[arg(long)]
    manual: bool,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Scene and simulation state, everything a frame touches except the GPU.
struct AppState {
    physics: PhysicsWorld,
    vehicle: Vehicle,
    sequencer: DriveSequencer,
    autopilot: bool,
    drive_mode: DriveMode,
    speed: f32,
    entities: Vec<Entity>,
    /// Parallel map from entity index to the rigid body driving its pose.
    bodies: Vec<(usize, cubekart_physics::BodyHandle)>,
    vehicle_entity: usize,
    preview: Entity,
    preview_enabled: bool,
    cameras: Vec<Camera>,
    active_camera: usize,
    light: Light,
    clear_color: [f32; 3],
    day_palette: bool,
    palette_dirty: bool,
    show_panel: bool,
    keys_held: HashSet<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
    tick_accumulator: f64,
    tick_rate: f64,
}

impl AppState {
    fn new(autopilot: bool) -> Self {
        let mut physics = PhysicsWorld::new();
        physics.add_ground_plane();

        let chassis = physics.spawn_chassis(Vec3::new(0.0, 0.6, 0.0), CHASSIS_HALF);
        let ball = physics.spawn_ball(Vec3::new(4.0, 3.0, -6.0), 0.5, Vec3::ZERO);

        // Renderables are attached once the device exists; the entities
        // and their body mapping are set up front.
        let entities = vec![Entity::new(), Entity::new()];
        let bodies = vec![(0, chassis), (1, ball)];

        let mut preview = Entity::new();
        preview.distance = 6.0;

        Self {
            physics,
            vehicle: Vehicle::new(chassis),
            sequencer: DriveSequencer::new(),
            autopilot,
            drive_mode: DriveMode::None,
            speed: 0.0,
            entities,
            bodies,
            vehicle_entity: 0,
            preview,
            preview_enabled: false,
            cameras: vec![Camera::default(), Camera::default()],
            active_camera: FOLLOW_CAMERA,
            light: Light::default(),
            clear_color: [0.05, 0.05, 0.08],
            day_palette: true,
            palette_dirty: false,
            show_panel: true,
            keys_held: HashSet::new(),
            mouse_captured: false,
            last_frame: Instant::now(),
            tick_accumulator: 0.0,
            tick_rate: 1.0 / 60.0,
        }
    }

    fn active_camera(&self) -> &Camera {
        &self.cameras[self.active_camera]
    }

    fn update(&mut self, dt: f32) {
        // Free-flight movement only applies to the free camera; the
        // follow camera is placed from the vehicle pose below.
        if self.active_camera == FREE_CAMERA {
            let cam = &mut self.cameras[FREE_CAMERA];
            if self.keys_held.contains(&KeyCode::KeyW) {
                cam.move_forward(dt);
            }
            if self.keys_held.contains(&KeyCode::KeyS) {
                cam.move_backward(dt);
            }
            if self.keys_held.contains(&KeyCode::KeyA) {
                cam.move_left(dt);
            }
            if self.keys_held.contains(&KeyCode::KeyD) {
                cam.move_right(dt);
            }
        }

        self.tick_accumulator += dt as f64;
        while self.tick_accumulator >= self.tick_rate {
            self.tick_accumulator -= self.tick_rate;
            let tick = self.tick_rate as f32;

            self.drive_mode = if self.autopilot {
                self.sequencer.advance(tick)
            } else if self.active_camera == FOLLOW_CAMERA {
                drive_mode_from_keys(&self.keys_held)
            } else {
                DriveMode::None
            };
            self.vehicle.apply_drive_mode(self.drive_mode);
            self.vehicle.apply_forces(&mut self.physics);
            self.physics.step(tick);
        }
        self.speed = self.vehicle.speed(&self.physics);

        for &(index, handle) in &self.bodies {
            let (pos, rot) = self.physics.body_pose(handle);
            let (yaw, pitch, roll) = rot.to_euler(EulerRot::YXZ);
            let entity = &mut self.entities[index];
            entity.set_position(pos.x, pos.y, pos.z);
            entity.set_rotation(pitch, yaw, roll);
        }

        let vehicle = &self.entities[self.vehicle_entity];
        let (target, target_yaw) = (vehicle.position, vehicle.yaw);
        self.cameras[FOLLOW_CAMERA].follow(target, target_yaw);
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_held.insert(key);
        } else {
            self.keys_held.remove(&key);
        }

        if !pressed {
            return;
        }

        match key {
            KeyCode::KeyC => {
                self.active_camera = (self.active_camera + 1) % self.cameras.len();
                tracing::info!(camera = self.active_camera, "switched camera");
            }
            KeyCode::KeyT => {
                self.autopilot = !self.autopilot;
                tracing::info!(autopilot = self.autopilot, "toggled autopilot");
            }
            KeyCode::F1 => {
                self.show_panel = !self.show_panel;
            }
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("debug_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("Cubekart");
                ui.separator();
                ui.label(format!("Drive: {}", self.drive_mode.label()));
                ui.label(format!("Speed: {:.1} m/s", self.speed));
                ui.checkbox(&mut self.autopilot, "Autopilot (T)");

                let camera_name = match self.active_camera {
                    FOLLOW_CAMERA => "Follow",
                    _ => "Free",
                };
                if ui.button(format!("Camera: {camera_name} (C)")).clicked() {
                    self.active_camera = (self.active_camera + 1) % self.cameras.len();
                }

                ui.separator();
                ui.heading("Light");
                ui.add(egui::Slider::new(&mut self.light.position.x, -30.0..=30.0).text("X"));
                ui.add(egui::Slider::new(&mut self.light.position.y, 1.0..=40.0).text("Y"));
                ui.add(egui::Slider::new(&mut self.light.position.z, -30.0..=30.0).text("Z"));

                ui.separator();
                ui.heading("Sky");
                ui.horizontal(|ui| {
                    if ui.selectable_label(self.day_palette, "Day").clicked() && !self.day_palette
                    {
                        self.day_palette = true;
                        self.palette_dirty = true;
                    }
                    if ui.selectable_label(!self.day_palette, "Dusk").clicked() && self.day_palette
                    {
                        self.day_palette = false;
                        self.palette_dirty = true;
                    }
                });
                ui.horizontal(|ui| {
                    ui.label("Clear color:");
                    ui.color_edit_button_rgb(&mut self.clear_color);
                });

                ui.separator();
                ui.heading("Preview");
                ui.checkbox(&mut self.preview_enabled, "Show preview object");
                if self.preview_enabled {
                    let pi = std::f32::consts::PI;
                    ui.add(egui::Slider::new(&mut self.preview.pitch, -pi..=pi).text("Pitch"));
                    ui.add(egui::Slider::new(&mut self.preview.yaw, -pi..=pi).text("Yaw"));
                    ui.add(egui::Slider::new(&mut self.preview.roll, -pi..=pi).text("Roll"));
                    ui.add(
                        egui::Slider::new(&mut self.preview.distance, 2.0..=20.0).text("Distance"),
                    );
                }

                ui.separator();
                ui.small("F1: panel | C: camera | T: autopilot | F: missile");
                ui.small("WASD: drive or fly | Shift+A/D: handbrake | Space: brake");
            });
    }
}

/// Manual control: map held keys to the nearest drive maneuver.
fn drive_mode_from_keys(keys: &HashSet<KeyCode>) -> DriveMode {
    let shift = keys.contains(&KeyCode::ShiftLeft) || keys.contains(&KeyCode::ShiftRight);
    if keys.contains(&KeyCode::KeyA) {
        if shift {
            DriveMode::HandbrakeTurnLeft
        } else {
            DriveMode::HardTurnLeft
        }
    } else if keys.contains(&KeyCode::KeyD) {
        if shift {
            DriveMode::HandbrakeTurnRight
        } else {
            DriveMode::HardTurnRight
        }
    } else if keys.contains(&KeyCode::KeyW) {
        DriveMode::AccelForwards
    } else if keys.contains(&KeyCode::KeyS) {
        DriveMode::AccelReverse
    } else if keys.contains(&KeyCode::Space) {
        DriveMode::Brake
    } else {
        DriveMode::None
    }
}

struct GpuApp {
    state: AppState,
    window_size: (u32, u32),
    window: Option<Arc<Window>>,
    gfx: Option<Gfx>,
    sky: Option<Renderable>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(autopilot: bool, window_size: (u32, u32)) -> Self {
        Self {
            state: AppState::new(autopilot),
            window_size,
            window: None,
            gfx: None,
            sky: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    /// Spawn a projectile from the active camera and give it a renderable.
    fn fire_missile(&mut self) {
        let Some(gfx) = &self.gfx else {
            return;
        };
        let camera = self.state.active_camera();
        let forward = camera.forward();
        let position = camera.position + forward * 2.0;
        let handle = self
            .state
            .physics
            .spawn_ball(position, MISSILE_RADIUS, forward * MISSILE_SPEED);

        let mesh = sphere_mesh(MISSILE_RADIUS, 12, 24, [0.95, 0.2, 0.2, 1.0]);
        let mut entity = Entity::new();
        entity.set_position(position.x, position.y, position.z);
        entity.attach_renderable(build_scene_renderable(
            &gfx.device,
            gfx.surface_format(),
            &mesh,
        ));

        let index = self.state.entities.len();
        self.state.entities.push(entity);
        self.state.bodies.push((index, handle));
        tracing::info!(index, "missile fired");
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
        self.state.last_frame = now;
        self.state.update(dt);

        let (Some(gfx), Some(window)) = (&self.gfx, &self.window) else {
            return;
        };

        let frame = match gfx.begin_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gfx.reconfigure();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let mut encoder = gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        let palette_dirty = std::mem::take(&mut self.state.palette_dirty);
        let palette = if self.state.day_palette {
            SkyPalette::DAY
        } else {
            SkyPalette::DUSK
        };

        {
            let [r, g, b] = self.state.clear_color;
            let mut pass = gfx.clear_pass(
                &mut encoder,
                &frame,
                wgpu::Color {
                    r: r as f64,
                    g: g as f64,
                    b: b as f64,
                    a: 1.0,
                },
            );

            let camera = self.state.active_camera();
            let aspect = gfx.aspect();

            if let Some(sky) = &self.sky {
                // The sky follows only the camera orientation, never its
                // position, so strip the translation from the view.
                let view_rot = Mat4::from_mat3(Mat3::from_mat4(camera.view_matrix()));
                let constants = SkyConstants {
                    proj_view: (projection(aspect) * view_rot).to_cols_array_2d(),
                };
                sky.update_vertex(&gfx.queue, bytemuck::bytes_of(&constants));
                if palette_dirty {
                    sky.update_pixel(&gfx.queue, bytemuck::bytes_of(&palette));
                }
                sky.render(&mut pass);
            }

            for entity in &self.state.entities {
                if entity.has_renderable() {
                    entity.render(&gfx.queue, &mut pass, camera, aspect, &self.state.light);
                }
            }
            if self.state.preview_enabled && self.state.preview.has_renderable() {
                self.state.preview.render_preview(&gfx.queue, &mut pass, aspect);
            }
        }

        let raw_input = self.egui_winit.as_mut().unwrap().take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });

        self.egui_winit
            .as_mut()
            .unwrap()
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let (width, height) = gfx.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        {
            let egui_renderer = self.egui_renderer.as_mut().unwrap();
            for (id, image_delta) in &full_output.textures_delta.set {
                egui_renderer.update_texture(&gfx.device, &gfx.queue, *id, image_delta);
            }
            egui_renderer.update_buffers(
                &gfx.device,
                &gfx.queue,
                &mut encoder,
                &paint_jobs,
                &screen_descriptor,
            );
            {
                let mut pass = encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("egui_pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &frame.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    })
                    .forget_lifetime();
                egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            for id in &full_output.textures_delta.free {
                egui_renderer.free_texture(id);
            }
        }

        gfx.present(frame, encoder);
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.window_size;
        let attrs = Window::default_attributes()
            .with_title("Cubekart")
            .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let gfx = match Gfx::new(window.clone()) {
            Ok(gfx) => gfx,
            Err(e) => {
                tracing::error!("graphics init failed: {e}");
                event_loop.exit();
                return;
            }
        };
        let format = gfx.surface_format();

        let chassis_mesh = cube_mesh(CHASSIS_HALF.to_array(), [0.9, 0.35, 0.1, 1.0]);
        self.state.entities[0].attach_renderable(build_scene_renderable(
            &gfx.device,
            format,
            &chassis_mesh,
        ));
        let ball_mesh = sphere_mesh(0.5, 12, 24, [0.2, 0.6, 0.9, 1.0]);
        self.state.entities[1].attach_renderable(build_scene_renderable(
            &gfx.device,
            format,
            &ball_mesh,
        ));
        let preview_mesh = cube_mesh([0.75; 3], [0.3, 0.8, 0.3, 1.0]);
        self.state.preview.attach_renderable(build_scene_renderable(
            &gfx.device,
            format,
            &preview_mesh,
        ));
        self.sky = Some(build_sky_renderable(&gfx.device, format));

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, format, None, 1, false);

        self.window = Some(window);
        self.gfx = Some(gfx);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gfx) = &mut self.gfx {
                    gfx.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if key == KeyCode::KeyF && pressed {
                    self.fire_missile();
                } else {
                    self.state.handle_key(key, pressed);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.state.mouse_captured = btn_state == ElementState::Pressed;
                if let Some(window) = &self.window {
                    window.set_cursor_visible(!self.state.mouse_captured);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.mouse_captured && self.state.active_camera == FREE_CAMERA {
                self.state.cameras[FREE_CAMERA].rotate(delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("cubekart-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(!cli.manual, (cli.width, cli.height));
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(codes: &[KeyCode]) -> HashSet<KeyCode> {
        codes.iter().copied().collect()
    }

    #[test]
    fn keys_map_to_drive_modes() {
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyW])),
            DriveMode::AccelForwards
        );
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyS])),
            DriveMode::AccelReverse
        );
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::Space])),
            DriveMode::Brake
        );
        assert_eq!(drive_mode_from_keys(&keys(&[])), DriveMode::None);
    }

    #[test]
    fn shift_selects_handbrake_turns() {
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyA])),
            DriveMode::HardTurnLeft
        );
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyA, KeyCode::ShiftLeft])),
            DriveMode::HandbrakeTurnLeft
        );
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyD, KeyCode::ShiftRight])),
            DriveMode::HandbrakeTurnRight
        );
    }

    #[test]
    fn turning_takes_priority_over_throttle() {
        assert_eq!(
            drive_mode_from_keys(&keys(&[KeyCode::KeyW, KeyCode::KeyD])),
            DriveMode::HardTurnRight
        );
    }

    #[test]
    fn state_ticks_vehicle_and_follows_it() {
        let mut state = AppState::new(true);
        for _ in 0..120 {
            state.update(1.0 / 60.0);
        }
        // Autopilot starts by accelerating forwards.
        let vehicle = &state.entities[state.vehicle_entity];
        assert!(vehicle.position.z < -0.1, "z = {}", vehicle.position.z);
        // The follow camera trails the vehicle, not the origin.
        let cam = &state.cameras[FOLLOW_CAMERA];
        assert!((cam.position - vehicle.position).length() < 20.0);
        assert!(state.speed > 0.1);
    }
}
