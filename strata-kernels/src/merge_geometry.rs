use strata_gpu::prelude::*;

pub fn main(
    global_id: UVec2,
    params: &MergeGeometryPassParams,
    records: Tex,
    prev_matches: Tex,
) -> [Vec4; 1] {
    let class_idx = global_id.y;
    let class = GeometryClass::from_index(class_idx);
    let record = records.read(global_id);

    let matched = if record.y > 0.0 {
        record.x.to_bits()
    } else if !class.is_static() || params.is_changed(class_idx) {
        // Dynamic geometry is re-uploaded each frame and must be matched
        // explicitly, and so must static geometry once it's been rebuilt
        NO_MATCH
    } else {
        let prev_matches = GeometryMatchMap::new(prev_matches);
        let global_index = class.global_index(global_id.x);

        if !prev_matches.is_populated(class_idx)
            || prev_matches.is_target(class_idx, global_index)
        {
            global_index
        } else {
            NO_MATCH
        }
    };

    [GeometryMatchMap::entry(matched)]
}
