mod fixtures;
mod intermediate;
mod refresher;
mod registrar;
