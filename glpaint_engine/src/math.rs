use std::ops::Mul;

/// A 4x4 float matrix stored as 16 contiguous row-major values.
///
/// The layout is the one GL expects when the array is uploaded with
/// `transpose = false`: the translation lives in the last row, and points are
/// transformed as row vectors (`p' = p * M`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub m: [f32; 16],
}

impl Matrix4 {
    pub const IDENTITY: Matrix4 = Matrix4 {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_rows(m: [f32; 16]) -> Self {
        Matrix4 { m }
    }

    /// Row-by-column product, `result[i][j] = sum_k u[i][k] * v[k][j]`.
    pub fn multiply(u: &Matrix4, v: &Matrix4) -> Matrix4 {
        let mut m = [0.0; 16];

        for i in 0..4 {
            for j in 0..4 {
                m[i * 4 + j] = (0..4).map(|k| u.m[i * 4 + k] * v.m[k * 4 + j]).sum();
            }
        }

        Matrix4 { m }
    }

    /// The `glOrtho` projection.
    ///
    /// Bounds must not be degenerate (`right != left`, `top != bottom`,
    /// `far_z != near_z`); nothing is checked here.
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near_z: f32, far_z: f32) -> Matrix4 {
        let dx = 1.0 / (right - left);
        let dy = 1.0 / (top - bottom);
        let dz = 1.0 / (far_z - near_z);
        let tx = -(right + left) * dx;
        let ty = -(top + bottom) * dy;
        let tz = -(far_z + near_z) * dz;

        Matrix4 {
            m: [
                2.0 * dx, 0.0, 0.0, 0.0, //
                0.0, 2.0 * dy, 0.0, 0.0, //
                0.0, 0.0, -2.0 * dz, 0.0, //
                tx, ty, tz, 1.0,
            ],
        }
    }

    /// Projection for a `width` x `height` backing store, composed with the
    /// identity model-view the painting view uses.
    pub fn viewport_mvp(width: f32, height: f32) -> Matrix4 {
        let projection = Matrix4::ortho(0.0, width, 0.0, height, -1.0, 1.0);
        Matrix4::multiply(&projection, &Matrix4::IDENTITY)
    }

    /// Transforms `(x, y, z, 1)` and divides by the resulting `w`.
    pub fn transform_point(&self, point: [f32; 3]) -> [f32; 3] {
        let v = [point[0], point[1], point[2], 1.0];
        let mut out = [0.0; 4];

        for (j, cell) in out.iter_mut().enumerate() {
            *cell = (0..4).map(|k| v[k] * self.m[k * 4 + j]).sum();
        }

        [out[0] / out[3], out[1] / out[3], out[2] / out[3]]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.m
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Matrix4::IDENTITY
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;

    fn mul(self, rhs: Matrix4) -> Matrix4 {
        Matrix4::multiply(&self, &rhs)
    }
}

impl From<nalgebra::Matrix4<f32>> for Matrix4 {
    fn from(matrix: nalgebra::Matrix4<f32>) -> Self {
        let mut m = [0.0; 16];
        for i in 0..4 {
            for j in 0..4 {
                m[i * 4 + j] = matrix[(i, j)];
            }
        }
        Matrix4 { m }
    }
}

impl From<Matrix4> for nalgebra::Matrix4<f32> {
    fn from(matrix: Matrix4) -> Self {
        nalgebra::Matrix4::from_row_slice(&matrix.m)
    }
}
