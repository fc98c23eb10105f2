//! Integration tests exercising full sweeps end to end

mod real_world;
