/// Texture coordinates for the four quad corners: top-left, bottom-left, bottom-right, top-right.
pub const QUAD_TEX_COORDS: [f32; 8] = [
    0.0, 0.0, // top-left
    0.0, 1.0, // bottom-left
    1.0, 1.0, // bottom-right
    1.0, 0.0, // top-right
];

/// Two triangles sharing the top-right/bottom-left diagonal.
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 3, // top-left triangle
    3, 1, 2, // bottom-right triangle
];

/// Corner order shared by vertex positions and [`QUAD_TEX_COORDS`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Corner {
    TopLeft = 0,
    BottomLeft = 1,
    BottomRight = 2,
    TopRight = 3,
}

/// World-space corners of a `width` x `height` quad centred on `position`.
///
/// The quad lies in the plane `z = position[2]`, +Y up. Output is flat `[x, y, z]`
/// per corner in [`Corner`] order.
pub fn quad_vertices(position: [f32; 3], width: f32, height: f32) -> [f32; 12] {
    let [x, y, z] = position;
    let hw = width * 0.5;
    let hh = height * 0.5;

    let (left, right) = (x - hw, x + hw);
    let (bottom, top) = (y - hh, y + hh);

    [
        left, top, z, //
        left, bottom, z, //
        right, bottom, z, //
        right, top, z,
    ]
}
