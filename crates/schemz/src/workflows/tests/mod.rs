mod common;
mod promotion;
mod routing;
mod schemes;
