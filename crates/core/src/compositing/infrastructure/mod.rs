pub mod alpha_compositor;
