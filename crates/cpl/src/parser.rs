//! CPL parsing: builds a [`Composition`] from a Composition Playlist XML
//! document (SMPTE ST 2067-3).
//!
//! Virtual tracks are identified by their `TrackId` across segments: all
//! sequences carrying the same `TrackId` contribute resources to the same
//! track, concatenated in segment order, then in document order within a
//! segment. Unknown sequence kinds are ignored for forward compatibility.

use crate::model::{
    BaseResource, Composition, Marker, MarkerResource, MarkerVirtualTrack, TrackFileResource,
    TrackFileVirtualTrack, DEFAULT_MARKER_SCOPE,
};
use crate::scalar::{child_by_local_name, element_text, read_rational, read_ulong, read_uuid};
use imf_common::{ImfError, ImfResult, Rational};
use roxmltree::{Document, Node};
use tracing::debug;
use uuid::Uuid;

/// Parse a CPL document from its XML text.
pub fn parse_cpl(xml: &str) -> ImfResult<Composition> {
    let doc = Document::parse(xml)
        .map_err(|e| ImfError::invalid(format!("malformed CPL XML: {e}")))?;
    parse_cpl_document(&doc)
}

/// Parse a CPL from an already-built DOM. Either a fully populated
/// [`Composition`] is returned, or an error; never a partial tree.
pub fn parse_cpl_document(doc: &Document) -> ImfResult<Composition> {
    let root = doc.root_element();
    if root.tag_name().name() != "CompositionPlaylist" {
        return Err(ImfError::invalid(format!(
            "unexpected root element: {}",
            root.tag_name().name()
        )));
    }

    let id = read_uuid(required_child(root, "Id")?)?;
    let edit_rate = read_rational(required_child(root, "EditRate")?)?;
    if !edit_rate.is_positive() {
        return Err(ImfError::invalid(format!(
            "composition edit rate must be positive: {edit_rate}"
        )));
    }
    let content_title = child_by_local_name(root, "ContentTitle")
        .map(element_text)
        .unwrap_or_default();

    debug!(%id, %edit_rate, title = %content_title, "parsing composition playlist");

    let mut composition = Composition {
        id,
        content_title,
        edit_rate,
        markers: None,
        image_2d: None,
        audios: Vec::new(),
    };

    let segment_list = required_child(root, "SegmentList")?;
    for segment in element_children(segment_list, "Segment") {
        let sequence_list = required_child(segment, "SequenceList")?;
        for sequence in sequence_list.children().filter(Node::is_element) {
            match sequence.tag_name().name() {
                "MainImageSequence" => {
                    let track_id = sequence_track_id(sequence)?;
                    let track = image_track_slot(&mut composition, track_id)?;
                    parse_track_file_resources(sequence, edit_rate, &mut track.resources)?;
                }
                "MainAudioSequence" => {
                    let track_id = sequence_track_id(sequence)?;
                    let track = audio_track_slot(&mut composition, track_id);
                    parse_track_file_resources(sequence, edit_rate, &mut track.resources)?;
                }
                "MarkerSequence" => {
                    let track_id = sequence_track_id(sequence)?;
                    let track = marker_track_slot(&mut composition, track_id)?;
                    parse_marker_resources(sequence, edit_rate, &mut track.resources)?;
                }
                other => {
                    debug!(sequence = other, "ignoring unsupported sequence kind");
                }
            }
        }
    }

    debug!(
        image = composition.image_2d.is_some(),
        audio_tracks = composition.audios.len(),
        markers = composition.markers.is_some(),
        "parsed composition playlist"
    );

    Ok(composition)
}

fn required_child<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &str,
) -> ImfResult<Node<'a, 'input>> {
    child_by_local_name(parent, name).ok_or_else(|| {
        ImfError::invalid(format!(
            "missing {name} element in {}",
            parent.tag_name().name()
        ))
    })
}

fn element_children<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    parent
        .children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn sequence_track_id(sequence: Node) -> ImfResult<Uuid> {
    read_uuid(required_child(sequence, "TrackId")?)
}

/// Slot for the single 2D image track. A second `MainImageSequence` with a
/// different `TrackId` is a constraint violation.
fn image_track_slot(
    composition: &mut Composition,
    track_id: Uuid,
) -> ImfResult<&mut TrackFileVirtualTrack> {
    match &composition.image_2d {
        Some(track) if track.id != track_id => {
            return Err(ImfError::invalid(
                "more than one main image virtual track declared",
            ));
        }
        Some(_) => {}
        None => {
            composition.image_2d = Some(TrackFileVirtualTrack {
                id: track_id,
                resources: Vec::new(),
            });
        }
    }
    Ok(composition.image_2d.as_mut().expect("just populated"))
}

/// Slot for the single marker track.
fn marker_track_slot(
    composition: &mut Composition,
    track_id: Uuid,
) -> ImfResult<&mut MarkerVirtualTrack> {
    match &composition.markers {
        Some(track) if track.id != track_id => {
            return Err(ImfError::invalid(
                "more than one marker virtual track declared",
            ));
        }
        Some(_) => {}
        None => {
            composition.markers = Some(MarkerVirtualTrack {
                id: track_id,
                resources: Vec::new(),
            });
        }
    }
    Ok(composition.markers.as_mut().expect("just populated"))
}

/// Audio track matching the sequence's `TrackId`, created on first sight.
fn audio_track_slot(composition: &mut Composition, track_id: Uuid) -> &mut TrackFileVirtualTrack {
    if let Some(pos) = composition.audios.iter().position(|t| t.id == track_id) {
        &mut composition.audios[pos]
    } else {
        composition.audios.push(TrackFileVirtualTrack {
            id: track_id,
            resources: Vec::new(),
        });
        composition.audios.last_mut().expect("just pushed")
    }
}

fn parse_track_file_resources(
    sequence: Node,
    default_edit_rate: Rational,
    out: &mut Vec<TrackFileResource>,
) -> ImfResult<()> {
    let resource_list = required_child(sequence, "ResourceList")?;
    for resource in element_children(resource_list, "Resource") {
        let base = parse_base_resource(resource, default_edit_rate)?;
        let track_file_uuid = read_uuid(required_child(resource, "TrackFileId")?)?;
        out.push(TrackFileResource {
            base,
            track_file_uuid,
        });
    }
    Ok(())
}

fn parse_marker_resources(
    sequence: Node,
    default_edit_rate: Rational,
    out: &mut Vec<MarkerResource>,
) -> ImfResult<()> {
    let resource_list = required_child(sequence, "ResourceList")?;
    for resource in element_children(resource_list, "Resource") {
        let base = parse_base_resource(resource, default_edit_rate)?;
        let markers = element_children(resource, "Marker")
            .map(parse_marker)
            .collect::<ImfResult<Vec<_>>>()?;
        out.push(MarkerResource { base, markers });
    }
    Ok(())
}

/// Timing fields common to every resource. `EditRate` defaults to the
/// composition edit rate, `EntryPoint` to 0, `RepeatCount` to 1.
fn parse_base_resource(resource: Node, default_edit_rate: Rational) -> ImfResult<BaseResource> {
    let edit_rate = match child_by_local_name(resource, "EditRate") {
        Some(node) => {
            let rate = read_rational(node)?;
            if !rate.is_positive() {
                return Err(ImfError::invalid(format!(
                    "resource edit rate must be positive: {rate}"
                )));
            }
            rate
        }
        None => default_edit_rate,
    };

    let entry_point = match child_by_local_name(resource, "EntryPoint") {
        Some(node) => read_ulong(node)?,
        None => 0,
    };

    let duration = read_ulong(required_child(resource, "SourceDuration")?)?;
    if duration == 0 {
        return Err(ImfError::invalid("resource duration must be non-zero"));
    }

    let repeat_count = match child_by_local_name(resource, "RepeatCount") {
        Some(node) => read_ulong(node)?,
        None => 1,
    };
    if repeat_count == 0 {
        return Err(ImfError::invalid("resource repeat count must be at least 1"));
    }

    Ok(BaseResource {
        edit_rate,
        entry_point,
        duration,
        repeat_count,
    })
}

fn parse_marker(marker: Node) -> ImfResult<Marker> {
    let label = required_child(marker, "Label")?;
    let scope = label
        .attribute("scope")
        .unwrap_or(DEFAULT_MARKER_SCOPE)
        .to_owned();
    let offset = read_ulong(required_child(marker, "Offset")?)?;
    Ok(Marker {
        label: element_text(label),
        scope,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_TRACK_ID: &str = "urn:uuid:6f1b72c5-36b0-4c94-bbf6-c6ebb4b2f35e";
    const AUDIO_TRACK_ID: &str = "urn:uuid:d4b51449-e2a9-4c8c-98e7-d224ab93a0cd";
    const MARKER_TRACK_ID: &str = "urn:uuid:48bdc2e1-0999-4624-b4f4-47031e164340";

    /// A two-segment CPL: image and audio sequences in both segments keyed
    /// by the same TrackIds, plus a marker sequence and an unknown one.
    fn full_cpl() -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<CompositionPlaylist xmlns="http://www.smpte-ra.org/schemas/2067-3/2016">
  <Id>urn:uuid:81bacd63-08c1-47fb-b3bb-354a9f9eb4e7</Id>
  <ContentTitle>Two Segment Feature</ContentTitle>
  <EditRate>24 1</EditRate>
  <SegmentList>
    <Segment>
      <SequenceList>
        <MainImageSequence>
          <TrackId>{image}</TrackId>
          <ResourceList>
            <Resource>
              <EditRate>24 1</EditRate>
              <SourceDuration>48</SourceDuration>
              <TrackFileId>urn:uuid:dd1845c9-8b0a-4a25-a4cc-8c0c4a26c3bb</TrackFileId>
            </Resource>
          </ResourceList>
        </MainImageSequence>
        <MainAudioSequence>
          <TrackId>{audio}</TrackId>
          <ResourceList>
            <Resource>
              <EditRate>48000 1</EditRate>
              <EntryPoint>96000</EntryPoint>
              <SourceDuration>96000</SourceDuration>
              <RepeatCount>2</RepeatCount>
              <TrackFileId>urn:uuid:0e5ca73c-9a25-41e9-b167-c3e1ad02d48f</TrackFileId>
            </Resource>
          </ResourceList>
        </MainAudioSequence>
        <MarkerSequence>
          <TrackId>{markers}</TrackId>
          <ResourceList>
            <Resource>
              <SourceDuration>96</SourceDuration>
              <Marker>
                <Label>FFOC</Label>
                <Offset>1</Offset>
              </Marker>
              <Marker>
                <Label scope="http://example.com/custom">LFOC</Label>
                <Offset>95</Offset>
              </Marker>
            </Resource>
          </ResourceList>
        </MarkerSequence>
        <SubtitlesSequence>
          <TrackId>urn:uuid:c2a2316b-93a6-4b81-8b62-32307f50f0c3</TrackId>
          <ResourceList/>
        </SubtitlesSequence>
      </SequenceList>
    </Segment>
    <Segment>
      <SequenceList>
        <MainImageSequence>
          <TrackId>{image}</TrackId>
          <ResourceList>
            <Resource>
              <SourceDuration>24</SourceDuration>
              <TrackFileId>urn:uuid:3d4e1a5f-8b3a-4c1e-9b8e-6c7f0a2d1e4b</TrackFileId>
            </Resource>
          </ResourceList>
        </MainImageSequence>
        <MainAudioSequence>
          <TrackId>{audio}</TrackId>
          <ResourceList>
            <Resource>
              <EditRate>48000 1</EditRate>
              <SourceDuration>48000</SourceDuration>
              <TrackFileId>urn:uuid:0e5ca73c-9a25-41e9-b167-c3e1ad02d48f</TrackFileId>
            </Resource>
          </ResourceList>
        </MainAudioSequence>
      </SequenceList>
    </Segment>
  </SegmentList>
</CompositionPlaylist>"#,
            image = IMAGE_TRACK_ID,
            audio = AUDIO_TRACK_ID,
            markers = MARKER_TRACK_ID,
        )
    }

    #[test]
    fn parses_full_composition() {
        let cpl = parse_cpl(&full_cpl()).expect("parse");

        assert_eq!(cpl.content_title, "Two Segment Feature");
        assert_eq!(cpl.edit_rate, Rational::FPS_24);

        // Image resources concatenate across segments
        let image = cpl.image_2d.as_ref().expect("image track");
        assert_eq!(image.resources.len(), 2);
        assert_eq!(image.resources[0].base.duration, 48);
        assert_eq!(image.resources[1].base.duration, 24);

        // Audio sequences with the same TrackId form a single track
        assert_eq!(cpl.audios.len(), 1);
        let audio = &cpl.audios[0];
        assert_eq!(audio.resources.len(), 2);
        assert_eq!(audio.resources[0].base.entry_point, 96000);
        assert_eq!(audio.resources[0].base.repeat_count, 2);
        assert_eq!(audio.resources[1].base.repeat_count, 1);

        // Markers present, unknown SubtitlesSequence ignored
        let markers = cpl.markers.as_ref().expect("marker track");
        assert_eq!(markers.resources.len(), 1);
        assert_eq!(markers.resources[0].markers.len(), 2);
    }

    #[test]
    fn resource_edit_rate_defaults_to_composition_rate() {
        let cpl = parse_cpl(&full_cpl()).expect("parse");
        let image = cpl.image_2d.as_ref().unwrap();
        // Second image resource declares no EditRate
        assert_eq!(image.resources[1].base.edit_rate, Rational::FPS_24);
        assert_eq!(image.resources[1].base.entry_point, 0);
        assert_eq!(image.resources[1].base.repeat_count, 1);
    }

    #[test]
    fn marker_scope_defaults_to_standard() {
        let cpl = parse_cpl(&full_cpl()).expect("parse");
        let markers = &cpl.markers.as_ref().unwrap().resources[0].markers;
        assert_eq!(markers[0].label, "FFOC");
        assert_eq!(markers[0].scope, DEFAULT_MARKER_SCOPE);
        assert_eq!(markers[0].offset, 1);
        assert_eq!(markers[1].scope, "http://example.com/custom");
    }

    #[test]
    fn reparse_yields_equal_composition() {
        let xml = full_cpl();
        let first = parse_cpl(&xml).expect("first parse");
        let second = parse_cpl(&xml).expect("second parse");
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_wrong_root_element() {
        let err = parse_cpl("<PackingList/>").unwrap_err();
        assert!(err.to_string().contains("root"));
    }

    #[test]
    fn rejects_missing_id() {
        let xml = r#"<CompositionPlaylist>
            <EditRate>24 1</EditRate><SegmentList/></CompositionPlaylist>"#;
        assert!(matches!(parse_cpl(xml), Err(ImfError::InvalidData(_))));
    }

    #[test]
    fn rejects_malformed_uuid() {
        let xml = r#"<CompositionPlaylist>
            <Id>urn:uuid:zzzz</Id>
            <EditRate>24 1</EditRate>
            <SegmentList/>
        </CompositionPlaylist>"#;
        assert!(matches!(parse_cpl(xml), Err(ImfError::InvalidData(_))));
    }

    #[test]
    fn rejects_missing_edit_rate() {
        let xml = r#"<CompositionPlaylist>
            <Id>urn:uuid:81bacd63-08c1-47fb-b3bb-354a9f9eb4e7</Id>
            <SegmentList/>
        </CompositionPlaylist>"#;
        assert!(matches!(parse_cpl(xml), Err(ImfError::InvalidData(_))));
    }

    #[test]
    fn rejects_negative_edit_rate() {
        let xml = r#"<CompositionPlaylist>
            <Id>urn:uuid:81bacd63-08c1-47fb-b3bb-354a9f9eb4e7</Id>
            <EditRate>-24 1</EditRate>
            <SegmentList/>
        </CompositionPlaylist>"#;
        assert!(matches!(parse_cpl(xml), Err(ImfError::InvalidData(_))));
    }

    fn single_sequence_cpl(sequence: &str) -> String {
        format!(
            r#"<CompositionPlaylist>
  <Id>urn:uuid:81bacd63-08c1-47fb-b3bb-354a9f9eb4e7</Id>
  <EditRate>24 1</EditRate>
  <SegmentList><Segment><SequenceList>{sequence}</SequenceList></Segment></SegmentList>
</CompositionPlaylist>"#
        )
    }

    #[test]
    fn rejects_second_image_track() {
        let sequences = format!(
            r#"<MainImageSequence>
  <TrackId>{IMAGE_TRACK_ID}</TrackId>
  <ResourceList>
    <Resource><SourceDuration>24</SourceDuration>
      <TrackFileId>urn:uuid:dd1845c9-8b0a-4a25-a4cc-8c0c4a26c3bb</TrackFileId>
    </Resource>
  </ResourceList>
</MainImageSequence>
<MainImageSequence>
  <TrackId>{AUDIO_TRACK_ID}</TrackId>
  <ResourceList>
    <Resource><SourceDuration>24</SourceDuration>
      <TrackFileId>urn:uuid:dd1845c9-8b0a-4a25-a4cc-8c0c4a26c3bb</TrackFileId>
    </Resource>
  </ResourceList>
</MainImageSequence>"#
        );
        let err = parse_cpl(&single_sequence_cpl(&sequences)).unwrap_err();
        assert!(err.to_string().contains("image"));
    }

    #[test]
    fn rejects_missing_track_id() {
        let sequence = r#"<MainImageSequence><ResourceList/></MainImageSequence>"#;
        assert!(parse_cpl(&single_sequence_cpl(sequence)).is_err());
    }

    #[test]
    fn rejects_missing_source_duration() {
        let sequence = format!(
            r#"<MainImageSequence>
  <TrackId>{IMAGE_TRACK_ID}</TrackId>
  <ResourceList>
    <Resource>
      <TrackFileId>urn:uuid:dd1845c9-8b0a-4a25-a4cc-8c0c4a26c3bb</TrackFileId>
    </Resource>
  </ResourceList>
</MainImageSequence>"#
        );
        assert!(parse_cpl(&single_sequence_cpl(&sequence)).is_err());
    }

    #[test]
    fn rejects_zero_repeat_count() {
        let sequence = format!(
            r#"<MainImageSequence>
  <TrackId>{IMAGE_TRACK_ID}</TrackId>
  <ResourceList>
    <Resource>
      <SourceDuration>24</SourceDuration>
      <RepeatCount>0</RepeatCount>
      <TrackFileId>urn:uuid:dd1845c9-8b0a-4a25-a4cc-8c0c4a26c3bb</TrackFileId>
    </Resource>
  </ResourceList>
</MainImageSequence>"#
        );
        assert!(parse_cpl(&single_sequence_cpl(&sequence)).is_err());
    }

    #[test]
    fn missing_content_title_defaults_to_empty() {
        let xml = r#"<CompositionPlaylist>
  <Id>urn:uuid:81bacd63-08c1-47fb-b3bb-354a9f9eb4e7</Id>
  <EditRate>24 1</EditRate>
  <SegmentList/>
</CompositionPlaylist>"#;
        let cpl = parse_cpl(xml).expect("parse");
        assert_eq!(cpl.content_title, "");
        assert!(cpl.image_2d.is_none());
        assert!(cpl.audios.is_empty());
    }
}
