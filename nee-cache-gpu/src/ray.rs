use glam::Vec3;

#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Ray {
    origin: Vec3,
    dir: Vec3,
    len: f32,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir,
            len: f32::MAX,
        }
    }

    pub fn with_len(mut self, len: f32) -> Self {
        self.len = len;
        self
    }

    pub fn origin(self) -> Vec3 {
        self.origin
    }

    pub fn dir(self) -> Vec3 {
        self.dir
    }

    /// Maximum distance along this ray that's considered by visibility tests.
    pub fn len(self) -> f32 {
        self.len
    }

    pub fn at(self, distance: f32) -> Vec3 {
        self.origin + self.dir * distance
    }
}
